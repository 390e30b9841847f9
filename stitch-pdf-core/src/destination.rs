//! Destinations and bookmarks.
//!
//! A destination names a page, a fit type, and the positional arguments the
//! fit type demands. Bookmarks and named destinations are both expressed in
//! these terms; the merger re-targets them by rewriting the page entry.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, PdfString};

/// How a viewer should frame the target page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitType {
    Xyz,
    Fit,
    FitH,
    FitV,
    FitR,
    FitB,
    FitBH,
    FitBV,
}

impl FitType {
    pub fn from_name(name: &str) -> Result<FitType> {
        match name {
            "XYZ" => Ok(FitType::Xyz),
            "Fit" => Ok(FitType::Fit),
            "FitH" => Ok(FitType::FitH),
            "FitV" => Ok(FitType::FitV),
            "FitR" => Ok(FitType::FitR),
            "FitB" => Ok(FitType::FitB),
            "FitBH" => Ok(FitType::FitBH),
            "FitBV" => Ok(FitType::FitBV),
            other => Err(PdfError::InvalidDestination(format!(
                "unknown fit type /{other}"
            ))),
        }
    }

    pub fn pdf_name(&self) -> &'static str {
        match self {
            FitType::Xyz => "XYZ",
            FitType::Fit => "Fit",
            FitType::FitH => "FitH",
            FitType::FitV => "FitV",
            FitType::FitR => "FitR",
            FitType::FitB => "FitB",
            FitType::FitBH => "FitBH",
            FitType::FitBV => "FitBV",
        }
    }

    /// Positional argument keys, in the order the destination array lists
    /// them.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            FitType::Xyz => &["Left", "Top", "Zoom"],
            FitType::FitR => &["Left", "Bottom", "Right", "Top"],
            FitType::FitH | FitType::FitBH => &["Top"],
            FitType::FitV | FitType::FitBV => &["Left"],
            FitType::Fit | FitType::FitB => &[],
        }
    }

    pub fn arity(&self) -> usize {
        self.field_names().len()
    }
}

/// Dictionary-backed view of a destination. Arity is checked at creation,
/// so a constructed value always projects a well-formed destination array.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    dict: Dictionary,
}

impl Destination {
    pub fn new(title: PdfString, page: Object, fit: FitType, args: Vec<Object>) -> Result<Self> {
        if args.len() != fit.arity() {
            return Err(PdfError::InvalidDestination(format!(
                "/{} takes {} arguments, got {}",
                fit.pdf_name(),
                fit.arity(),
                args.len()
            )));
        }
        let mut dict = Dictionary::new();
        dict.set("Title", title);
        dict.set("Page", page);
        dict.set("Type", Object::name(fit.pdf_name()));
        for (key, value) in fit.field_names().iter().zip(args) {
            dict.set(*key, value);
        }
        Ok(Destination { dict })
    }

    /// Builds from a raw destination array: `[page /FitType args...]`.
    pub fn from_array(title: PdfString, array: &[Object]) -> Result<Self> {
        let (page, typ) = match array {
            [page, typ, ..] => (page, typ),
            _ => {
                return Err(PdfError::InvalidDestination(
                    "destination array needs a page and a fit type".to_string(),
                ))
            }
        };
        let fit = match typ.as_name() {
            Some(name) => FitType::from_name(name.as_str())?,
            None => {
                return Err(PdfError::InvalidDestination(
                    "destination fit type is not a name".to_string(),
                ))
            }
        };
        Destination::new(title, page.clone(), fit, array[2..].to_vec())
    }

    pub fn title(&self) -> Option<&PdfString> {
        self.dict.get("Title").and_then(Object::as_string)
    }

    pub fn page(&self) -> Option<&Object> {
        self.dict.get("Page")
    }

    pub fn set_page(&mut self, page: impl Into<Object>) {
        self.dict.set("Page", page);
    }

    pub fn fit(&self) -> Result<FitType> {
        match self.dict.get("Type").and_then(Object::as_name) {
            Some(name) => FitType::from_name(name.as_str()),
            None => Err(PdfError::InvalidDestination(
                "destination has no fit type".to_string(),
            )),
        }
    }

    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// `[page, type, <fields present, in Left Bottom Right Top Zoom order>]`.
    pub fn dest_array(&self) -> Vec<Object> {
        let mut out = vec![
            self.page().cloned().unwrap_or(Object::Null),
            self.dict.get("Type").cloned().unwrap_or(Object::Null),
        ];
        for key in ["Left", "Bottom", "Right", "Top", "Zoom"] {
            if let Some(value) = self.dict.get(key) {
                out.push(value.clone());
            }
        }
        out
    }
}
