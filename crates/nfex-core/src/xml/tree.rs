//! Minimal namespace-aware element tree.
//!
//! Fiscal archives mix producers that emit the canonical NF-e
//! namespace with producers that emit none at all, so lookups take an
//! explicit namespace candidate instead of assuming one. The tree is
//! built eagerly from `quick_xml` events; documents are small (one
//! invoice each), so holding them in memory is fine.

use quick_xml::events::Event;
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;

use crate::error::XmlError;

/// One element of a parsed document.
#[derive(Debug, Clone)]
pub struct Element {
    /// Local (unqualified) element name.
    pub local_name: String,

    /// Resolved namespace URI, `None` for unqualified elements.
    pub namespace: Option<String>,

    /// Concatenated character data directly inside this element.
    pub text: String,

    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    fn new(local_name: String, namespace: Option<String>) -> Self {
        Self {
            local_name,
            namespace,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Whether this element has the given local name and namespace.
    pub fn matches(&self, local_name: &str, namespace: Option<&str>) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    /// First direct child matching name and namespace.
    pub fn child(&self, local_name: &str, namespace: Option<&str>) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.matches(local_name, namespace))
    }

    /// First matching descendant, depth-first, excluding self.
    pub fn descendant(&self, local_name: &str, namespace: Option<&str>) -> Option<&Element> {
        for child in &self.children {
            if child.matches(local_name, namespace) {
                return Some(child);
            }
            if let Some(found) = child.descendant(local_name, namespace) {
                return Some(found);
            }
        }
        None
    }

    /// All matching descendants in document order, excluding self.
    pub fn descendants(&self, local_name: &str, namespace: Option<&str>) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(local_name, namespace, &mut found);
        found
    }

    fn collect_descendants<'a>(
        &'a self,
        local_name: &str,
        namespace: Option<&str>,
        found: &mut Vec<&'a Element>,
    ) {
        for child in &self.children {
            if child.matches(local_name, namespace) {
                found.push(child);
            }
            child.collect_descendants(local_name, namespace, found);
        }
    }

    /// Trimmed text content, `None` when empty.
    pub fn text_trimmed(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Parse raw document bytes into an element tree.
///
/// Returns the root element, or an error for markup that is not
/// well-formed. Namespace prefixes are resolved while reading; only
/// the resolved URI is kept on each element.
pub fn parse_document(content: &[u8]) -> Result<Element, XmlError> {
    let mut reader = NsReader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(XmlError::from)? {
            Event::Start(start) => {
                let element = resolve(&reader, start.name());
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = resolve(&reader, start.name());
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .map_err(|e| XmlError::Malformed(e.to_string()))?;
                    open.text.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                // quick-xml rejects mismatched end tags before we get here.
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".into()));
    }

    root.ok_or(XmlError::NoRoot)
}

fn resolve(reader: &NsReader<&[u8]>, name: QName<'_>) -> Element {
    let (result, local) = reader.resolve_element(name);
    let namespace = match result {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.into_inner()).into_owned()),
        _ => None,
    };
    Element::new(
        String::from_utf8_lossy(local.into_inner()).into_owned(),
        namespace,
    )
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    }
}
