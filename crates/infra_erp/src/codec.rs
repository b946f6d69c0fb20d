//! XML codec for the incoming-invoice import endpoint
//!
//! # Request document
//!
//! ```text
//! <document>
//!   <items>
//!     <item>
//!       <num/> <product/> <amount/> <price/> <sum/> <store/>
//!     </item>
//!     ...
//!   </items>
//!   <supplier/> <defaultStore/> [<conception/>]
//!   <documentNumber/> <dateIncoming/> [<externalId/>]
//! </document>
//! ```
//!
//! Decimals are written exactly as held, scale included. Encoding is
//! deterministic: the same invoice always yields the same bytes.
//!
//! # Response document
//!
//! Any root element whose children include `valid`, and optionally
//! `documentNumber` and `error` (older servers say `errorMessage`).

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use domain_invoice::{Invoice, InvoiceItem, SupplierRecord};

use crate::error::ErpError;

/// Root element of the import document
pub const ROOT_ELEMENT: &str = "document";

/// The ERP expects a fixed time of day on the incoming date
const DATE_INCOMING_FORMAT: &str = "%Y-%m-%dT08:00:00";

/// Message used when the ERP rejects a document without saying why
pub const UNKNOWN_VALIDATION_ERROR: &str = "Unknown validation error";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("failed to encode invoice: {0}")]
    Encode(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<CodecError> for ErpError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encode(msg) => ErpError::Validation(msg),
            CodecError::MalformedResponse(msg) => ErpError::malformed_response(msg),
        }
    }
}

fn malformed(detail: impl std::fmt::Display) -> CodecError {
    CodecError::MalformedResponse(detail.to_string())
}

/// Decoded import response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub valid: bool,
    pub document_number: Option<String>,
    pub error_message: Option<String>,
}

impl ImportResponse {
    /// Rejection message, falling back to a generic one
    pub fn rejection_reason(&self) -> &str {
        self.error_message
            .as_deref()
            .unwrap_or(UNKNOWN_VALIDATION_ERROR)
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes an invoice as the import XML document
pub fn encode(invoice: &Invoice) -> Result<String, CodecError> {
    let mut writer = Writer::new(Vec::new());
    write_document(&mut writer, invoice).map_err(|e| CodecError::Encode(e.to_string()))?;
    String::from_utf8(writer.into_inner()).map_err(|e| CodecError::Encode(e.to_string()))
}

fn write_document(writer: &mut Writer<Vec<u8>>, invoice: &Invoice) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

    writer.write_event(Event::Start(BytesStart::new("items")))?;
    for item in invoice.items() {
        write_item(writer, invoice, item)?;
    }
    writer.write_event(Event::End(BytesEnd::new("items")))?;

    write_text(writer, "supplier", invoice.supplier().as_str())?;
    write_text(writer, "defaultStore", invoice.default_store().as_str())?;
    if let Some(conception) = invoice.conception() {
        write_text(writer, "conception", conception.as_str())?;
    }
    write_text(writer, "documentNumber", invoice.document_number())?;
    let date = invoice.date_incoming().format(DATE_INCOMING_FORMAT).to_string();
    write_text(writer, "dateIncoming", &date)?;
    if let Some(external_id) = invoice.external_id() {
        write_text(writer, "externalId", external_id)?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    Ok(())
}

fn write_item(
    writer: &mut Writer<Vec<u8>>,
    invoice: &Invoice,
    item: &InvoiceItem,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;
    write_text(writer, "num", &item.num().to_string())?;
    write_text(writer, "product", item.product().as_str())?;
    write_text(writer, "amount", &item.amount().to_string())?;
    write_text(writer, "price", &item.price().to_string())?;
    write_text(writer, "sum", &item.sum().to_string())?;
    write_text(writer, "store", invoice.store_for(item).as_str())?;
    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.text.trim())
    }

    fn non_empty_child_text(&self, name: &str) -> Option<String> {
        self.child_text(name)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

fn attach(stack: &mut Vec<Node>, root: &mut Option<Node>, node: Node) -> Result<(), CodecError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => return Err(malformed("multiple root elements")),
        None => *root = Some(node),
    }
    Ok(())
}

fn parse_tree(xml: &str) -> Result<Node, CodecError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed("multiple root elements"));
                }
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                stack.push(Node::named(name));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                attach(&mut stack, &mut root, Node::named(name))?;
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or_else(|| malformed("unexpected closing tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(malformed)?;
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&text),
                    None => return Err(malformed("text outside the root element")),
                }
            }
            Ok(Event::CData(c)) => {
                let bytes = c.into_inner();
                match stack.last_mut() {
                    Some(node) => node.text.push_str(&String::from_utf8_lossy(&bytes)),
                    None => return Err(malformed("text outside the root element")),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(e)),
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unclosed element"));
    }
    root.ok_or_else(|| malformed("no root element"))
}

/// Decodes the import endpoint's response
///
/// A missing `valid` element counts as a rejection.
pub fn decode(xml: &str) -> Result<ImportResponse, CodecError> {
    let root = parse_tree(xml)?;

    let valid = root
        .child_text("valid")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let error_message = root
        .non_empty_child_text("error")
        .or_else(|| root.non_empty_child_text("errorMessage"));

    Ok(ImportResponse {
        valid,
        document_number: root.non_empty_child_text("documentNumber"),
        error_message,
    })
}

/// Decodes the supplier directory
///
/// Accepts the JSON array returned by current servers or the XML
/// `<employees><employee><id/><name/></employee></employees>` listing of
/// older ones.
pub fn decode_suppliers(body: &str) -> Result<Vec<SupplierRecord>, CodecError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        let root = parse_tree(trimmed)?;
        return Ok(root
            .children
            .iter()
            .filter_map(|node| {
                let id = node.non_empty_child_text("id")?;
                let name = node.child_text("name").unwrap_or_default();
                Some(SupplierRecord::new(id, name))
            })
            .collect());
    }

    serde_json::from_str(trimmed).map_err(malformed)
}
