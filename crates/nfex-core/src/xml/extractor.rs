//! Line-item extraction from a single fiscal document.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::error::XmlError;
use crate::models::{DocumentClass, LineItem};

use super::tree::{parse_document, Element};

/// Canonical NF-e/NFC-e namespace.
pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Namespace candidates tried in order for every lookup. Some schema
/// producers omit the namespace entirely, so each structural path is
/// retried unqualified before giving up.
const NS_CANDIDATES: [Option<&str>; 2] = [Some(NFE_NAMESPACE), None];

/// Outcome of extracting one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Retained line items, in document order.
    pub records: Vec<LineItem>,

    /// Count of quantity/price texts that were present but unparsable
    /// and degraded to zero.
    pub degraded_fields: usize,
}

/// Extracts normalized line items from one NF-e/NFC-e document.
///
/// Tolerant by contract: partially filled items are kept, numeric
/// fields degrade to zero, and an item without a nested `prod`
/// element or without any product identity is skipped. Only malformed
/// markup fails a document, and even that surfaces as an empty result
/// through [`ItemExtractor::extract`].
pub struct ItemExtractor;

impl ItemExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract line items, swallowing any document-level failure.
    ///
    /// Corrupt or off-schema files are common in real fiscal
    /// archives; from the caller's point of view they simply yield
    /// zero records.
    pub fn extract(&self, source_id: &str, content: &[u8], class: DocumentClass) -> Vec<LineItem> {
        match self.try_extract(source_id, content, class) {
            Ok(extraction) => extraction.records,
            Err(err) => {
                debug!(source_id, %err, "document yielded no records");
                Vec::new()
            }
        }
    }

    /// Extract line items, reporting document-level failures.
    ///
    /// The batch step uses this surface so it can tag the failing
    /// document instead of silently swallowing it.
    pub fn try_extract(
        &self,
        source_id: &str,
        content: &[u8],
        class: DocumentClass,
    ) -> Result<Extraction, XmlError> {
        let root = parse_document(content)?;

        let emitted_at_text = header_timestamp(&root);

        // Zero, one, or many items per document.
        let mut items: Vec<&Element> = Vec::new();
        for ns in NS_CANDIDATES {
            items = root.descendants("det", ns);
            if !items.is_empty() {
                break;
            }
        }

        let mut records = Vec::new();
        let mut degraded_fields = 0usize;

        for det in items {
            // An item without a product sub-element produces no record.
            let Some(prod) = lookup_child(det, "prod") else {
                continue;
            };

            let (quantity, quantity_degraded) = parse_decimal(child_text(prod, "qCom").as_deref());
            let (unit_price, price_degraded) = parse_decimal(child_text(prod, "vUnCom").as_deref());
            degraded_fields += usize::from(quantity_degraded) + usize::from(price_degraded);

            let record = LineItem {
                source_id: source_id.to_owned(),
                document_class: class,
                emitted_at_text: emitted_at_text.clone(),
                emitted_at: None,
                product_code: child_text(prod, "cProd"),
                product_name: child_text(prod, "xProd"),
                ncm_code: child_text(prod, "NCM"),
                cfop_code: child_text(prod, "CFOP"),
                barcode: child_text(prod, "cEAN"),
                quantity,
                unit_price,
                line_total: quantity * unit_price,
            };

            if record.is_identifiable() {
                records.push(record);
            } else {
                debug!(source_id, "skipping line item with no code and no name");
            }
        }

        Ok(Extraction {
            records,
            degraded_fields,
        })
    }
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw emission timestamp from the document header.
///
/// Layout 4.x carries `dhEmi`; layout 2.0 files only have `dEmi`.
/// The text is not parsed here: parsing happens once at the batch
/// step, over the whole column.
fn header_timestamp(root: &Element) -> Option<String> {
    let ide = NS_CANDIDATES
        .iter()
        .find_map(|ns| root.descendant("ide", *ns))?;
    child_text(ide, "dhEmi").or_else(|| child_text(ide, "dEmi"))
}

fn lookup_child<'a>(element: &'a Element, local_name: &str) -> Option<&'a Element> {
    NS_CANDIDATES
        .iter()
        .find_map(|ns| element.child(local_name, *ns))
}

fn child_text(element: &Element, local_name: &str) -> Option<String> {
    lookup_child(element, local_name)
        .and_then(|child| child.text_trimmed())
        .map(str::to_owned)
}

/// Decimal conversion with degradation to zero.
///
/// Absent text is expected data variance and defaults quietly;
/// present-but-unparsable (or negative) text also defaults, but is
/// flagged so the batch can count it.
fn parse_decimal(text: Option<&str>) -> (Decimal, bool) {
    let Some(raw) = text else {
        return (Decimal::ZERO, false);
    };

    let parsed = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_str(&raw.replace(',', ".")))
        .ok();

    match parsed {
        Some(value) if value >= Decimal::ZERO => (value, false),
        _ => (Decimal::ZERO, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_document(namespace: &str) -> String {
        let xmlns = if namespace.is_empty() {
            String::new()
        } else {
            format!(r#" xmlns="{namespace}""#)
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc{xmlns} versao="4.00">
  <NFe>
    <infNFe>
      <ide>
        <nNF>123</nNF>
        <dhEmi>2024-03-01T10:15:00-03:00</dhEmi>
      </ide>
      <det nItem="1">
        <prod>
          <cProd>P1</cProd>
          <xProd>Café torrado 500g</xProd>
          <NCM>09012100</NCM>
          <CFOP>5102</CFOP>
          <cEAN>7891234567890</cEAN>
          <qCom>3.0000</qCom>
          <vUnCom>10.00</vUnCom>
        </prod>
      </det>
      <det nItem="2">
        <prod>
          <cProd>P2</cProd>
          <xProd>Açúcar cristal 1kg</xProd>
          <CFOP>5405</CFOP>
          <qCom>2.0000</qCom>
          <vUnCom>4.50</vUnCom>
        </prod>
      </det>
    </infNFe>
  </NFe>
</nfeProc>"#
        )
    }

    #[test]
    fn test_extracts_all_items() {
        let extractor = ItemExtractor::new();
        let records = extractor.extract(
            "nota.xml",
            sample_document(NFE_NAMESPACE).as_bytes(),
            DocumentClass::Sale,
        );

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.source_id, "nota.xml");
        assert_eq!(first.product_code.as_deref(), Some("P1"));
        assert_eq!(first.product_name.as_deref(), Some("Café torrado 500g"));
        assert_eq!(first.ncm_code.as_deref(), Some("09012100"));
        assert_eq!(first.cfop_code.as_deref(), Some("5102"));
        assert_eq!(first.barcode.as_deref(), Some("7891234567890"));
        assert_eq!(first.quantity, Decimal::from(3));
        assert_eq!(first.unit_price, Decimal::from(10));
        assert_eq!(first.line_total, Decimal::from(30));
        assert_eq!(
            first.emitted_at_text.as_deref(),
            Some("2024-03-01T10:15:00-03:00")
        );

        // Second item has no NCM and no barcode; partial data is fine.
        let second = &records[1];
        assert_eq!(second.ncm_code, None);
        assert_eq!(second.barcode, None);
        assert_eq!(second.line_total, "9.0".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_namespace_fallback_equivalence() {
        let extractor = ItemExtractor::new();
        let namespaced = extractor.extract(
            "nota.xml",
            sample_document(NFE_NAMESPACE).as_bytes(),
            DocumentClass::Sale,
        );
        let stripped = extractor.extract(
            "nota.xml",
            sample_document("").as_bytes(),
            DocumentClass::Sale,
        );

        assert_eq!(namespaced, stripped);
    }

    #[test]
    fn test_foreign_namespace_yields_nothing() {
        let extractor = ItemExtractor::new();
        let records = extractor.extract(
            "nota.xml",
            sample_document("http://example.com/other").as_bytes(),
            DocumentClass::Sale,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_zero_items_is_empty_not_an_error() {
        let xml = format!(
            r#"<nfeProc xmlns="{NFE_NAMESPACE}"><NFe><infNFe><ide><dhEmi>2024-01-01T00:00:00-03:00</dhEmi></ide></infNFe></NFe></nfeProc>"#
        );
        let extraction = ItemExtractor::new()
            .try_extract("nota.xml", xml.as_bytes(), DocumentClass::Sale)
            .unwrap();
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn test_malformed_document_extracts_to_empty() {
        let extractor = ItemExtractor::new();
        let records = extractor.extract("bad.xml", b"<nfeProc><NFe>", DocumentClass::Sale);
        assert!(records.is_empty());

        assert!(extractor
            .try_extract("bad.xml", b"<nfeProc><NFe>", DocumentClass::Sale)
            .is_err());
    }

    #[test]
    fn test_item_without_prod_is_skipped() {
        let xml = r#"<nfeProc><NFe><infNFe>
            <det nItem="1"><imposto/></det>
            <det nItem="2"><prod><cProd>P9</cProd></prod></det>
        </infNFe></NFe></nfeProc>"#;
        let records =
            ItemExtractor::new().extract("nota.xml", xml.as_bytes(), DocumentClass::Purchase);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_code.as_deref(), Some("P9"));
        // Absent numeric fields default to zero.
        assert_eq!(records[0].quantity, Decimal::ZERO);
        assert_eq!(records[0].line_total, Decimal::ZERO);
    }

    #[test]
    fn test_retention_requires_code_or_name() {
        let xml = r#"<nfeProc><NFe><infNFe>
            <det><prod><qCom>5</qCom><vUnCom>2.00</vUnCom></prod></det>
        </infNFe></NFe></nfeProc>"#;
        let records = ItemExtractor::new().extract("nota.xml", xml.as_bytes(), DocumentClass::Sale);
        assert!(records.is_empty());
    }

    #[test]
    fn test_unparsable_quantity_degrades_to_zero() {
        let xml = r#"<nfeProc><NFe><infNFe>
            <det><prod><cProd>P1</cProd><qCom>abc</qCom><vUnCom>5.0</vUnCom></prod></det>
        </infNFe></NFe></nfeProc>"#;
        let extraction = ItemExtractor::new()
            .try_extract("nota.xml", xml.as_bytes(), DocumentClass::Sale)
            .unwrap();

        let record = &extraction.records[0];
        assert_eq!(record.quantity, Decimal::ZERO);
        assert_eq!(record.unit_price, "5.0".parse::<Decimal>().unwrap());
        assert_eq!(record.line_total, Decimal::ZERO);
        assert_eq!(extraction.degraded_fields, 1);
    }

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal(None), (Decimal::ZERO, false));
        assert_eq!(parse_decimal(Some("1.5000")), ("1.5".parse().unwrap(), false));
        assert_eq!(parse_decimal(Some("2,5")), ("2.5".parse().unwrap(), false));
        assert_eq!(parse_decimal(Some("")), (Decimal::ZERO, true));
        assert_eq!(parse_decimal(Some("x")), (Decimal::ZERO, true));
        assert_eq!(parse_decimal(Some("-1")), (Decimal::ZERO, true));
    }

    #[test]
    fn test_demi_fallback_for_old_layout() {
        let xml = r#"<nfeProc><NFe><infNFe>
            <ide><dEmi>2012-08-01</dEmi></ide>
            <det><prod><cProd>P1</cProd></prod></det>
        </infNFe></NFe></nfeProc>"#;
        let records = ItemExtractor::new().extract("nota.xml", xml.as_bytes(), DocumentClass::Sale);
        assert_eq!(records[0].emitted_at_text.as_deref(), Some("2012-08-01"));
    }
}
