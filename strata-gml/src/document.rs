//! Namespace-aware XML element tree.
//!
//! Feature collections are small enough to be read into memory in one go, and the feature walk
//! needs random access to children, attributes and text content, so the document is materialized
//! as a tree of [`XmlElement`]s.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::GmlError;

/// Node of an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element.
    Element(XmlElement),
    /// Character data (text or CDATA section), unescaped.
    Text(String),
}

/// Attribute of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    name: String,
    value: String,
}

impl XmlAttribute {
    /// Name as written in the document, including the prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without the namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Unescaped value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Parses a complete document and returns its root element.
    pub fn parse(text: &str) -> Result<XmlElement, GmlError> {
        let mut reader = NsReader::from_str(text);
        let mut stack: Vec<XmlElement> = vec![];
        let mut root = None;

        loop {
            match reader.read_resolved_event()? {
                (ns, Event::Start(start)) => {
                    stack.push(Self::from_start(ns, &start)?);
                }
                (ns, Event::Empty(start)) => {
                    let element = Self::from_start(ns, &start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                (_, Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| GmlError::Xml("unexpected closing tag".into()))?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                (_, Event::Text(text)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::Text(text.unescape()?.into_owned()));
                    }
                }
                (_, Event::CData(data)) => {
                    if let Some(parent) = stack.last_mut() {
                        let data = data.into_inner();
                        parent
                            .children
                            .push(XmlNode::Text(String::from_utf8_lossy(&data).into_owned()));
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(GmlError::Xml("unexpected end of document".into()));
        }

        root.ok_or_else(|| GmlError::Xml("document has no root element".into()))
    }

    fn from_start(ns: ResolveResult, start: &BytesStart) -> Result<XmlElement, GmlError> {
        let namespace = match ns {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(GmlError::Xml(format!(
                    "undeclared namespace prefix {}",
                    String::from_utf8_lossy(&prefix)
                )));
            }
        };

        let mut attributes = vec![];
        for attribute in start.attributes() {
            let attribute = attribute?;
            let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            if name == "xmlns" || name.starts_with("xmlns:") {
                continue;
            }

            attributes.push(XmlAttribute {
                name,
                value: attribute.unescape_value()?.into_owned(),
            });
        }

        Ok(XmlElement {
            namespace,
            local_name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            children: vec![],
        })
    }

    fn attach(
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
        element: XmlElement,
    ) -> Result<(), GmlError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),
            None if root.is_none() => *root = Some(element),
            None => return Err(GmlError::Xml("document has several root elements".into())),
        }

        Ok(())
    }

    /// Namespace URI of the element.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Element name without the prefix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns true if the element has the given local name and its namespace is accepted by
    /// `namespace`.
    pub fn is(&self, namespace: impl Fn(Option<&str>) -> bool, local_name: &str) -> bool {
        self.local_name == local_name && namespace(self.namespace())
    }

    /// All attributes in document order, namespace declarations excluded.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Value of the attribute with the given name as written in the document.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value())
    }

    /// Value of the first attribute with the given local name, whatever its prefix.
    pub fn attribute_by_local_name(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.local_name() == local_name)
            .map(|attr| attr.value())
    }

    /// Child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element, if any.
    pub fn first_child_element(&self) -> Option<&XmlElement> {
        self.child_elements().next()
    }

    /// Returns true if the element contains at least one child element.
    pub fn has_child_elements(&self) -> bool {
        self.first_child_element().is_some()
    }

    /// Concatenated text of the element and all its descendants.
    pub fn text_content(&self) -> Cow<'_, str> {
        match self.children.as_slice() {
            [] => Cow::Borrowed(""),
            [XmlNode::Text(text)] => Cow::Borrowed(text.as_str()),
            _ => {
                let mut text = String::new();
                self.collect_text(&mut text);
                Cow::Owned(text)
            }
        }
    }

    fn collect_text(&self, buffer: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => buffer.push_str(text),
                XmlNode::Element(element) => element.collect_text(buffer),
            }
        }
    }
}
