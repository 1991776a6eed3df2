//! Human-readable document numbers: `{PREFIX}-{YYYYMMDD}-{sequence}`.
//!
//! Sequences are scoped per tenant, per document kind, per calendar day. The
//! counter itself lives in the store so allocation happens inside the same
//! transaction that creates the document.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Document families that receive a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PurchaseOrder,
    ShipmentNotice,
    SalesOrder,
    Picking,
    Putaway,
}

impl DocumentKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::PurchaseOrder => "PO",
            DocumentKind::ShipmentNotice => "ASN",
            DocumentKind::SalesOrder => "SO",
            DocumentKind::Picking => "PCK",
            DocumentKind::Putaway => "PUT",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "PO" => Some(DocumentKind::PurchaseOrder),
            "ASN" => Some(DocumentKind::ShipmentNotice),
            "SO" => Some(DocumentKind::SalesOrder),
            "PCK" => Some(DocumentKind::Picking),
            "PUT" => Some(DocumentKind::Putaway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber {
    pub kind: DocumentKind,
    pub date: NaiveDate,
    pub sequence: u32,
}

impl DocumentNumber {
    pub fn new(kind: DocumentKind, date: NaiveDate, sequence: u32) -> Self {
        Self {
            kind,
            date,
            sequence,
        }
    }
}

impl core::fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.kind.prefix(),
            self.date.format("%Y%m%d"),
            self.sequence
        )
    }
}

impl FromStr for DocumentNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let (Some(prefix), Some(date), Some(seq)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::validation(format!(
                "document number '{s}' is not PREFIX-YYYYMMDD-SEQ"
            )));
        };

        let kind = DocumentKind::from_prefix(prefix).ok_or_else(|| {
            DomainError::validation(format!("unknown document prefix '{prefix}'"))
        })?;
        let date = NaiveDate::parse_from_str(date, "%Y%m%d")
            .map_err(|e| DomainError::validation(format!("bad document date '{date}': {e}")))?;
        let sequence = seq
            .parse::<u32>()
            .map_err(|e| DomainError::validation(format!("bad document sequence '{seq}': {e}")))?;

        Ok(Self::new(kind, date, sequence))
    }
}
