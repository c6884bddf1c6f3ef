//! Status enumerations for each document family.
//!
//! The string forms are part of the public contract and match the values
//! stored in the database exactly (e.g. `Partially Paid`).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! document_status {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every status, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the exact string representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// Parses a status, ignoring ASCII case and surrounding whitespace.
            pub fn parse(s: &str) -> Option<Self> {
                let s = s.trim();
                Self::ALL.iter().copied().find(|v| v.as_str().eq_ignore_ascii_case(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

document_status! {
    /// Estimate lifecycle status.
    EstimateStatus {
        /// Being prepared.
        Draft => "Draft",
        /// Sent to the customer.
        Sent => "Sent",
        /// Past its validity date.
        Expired => "Expired",
        /// Rejected by the customer.
        Declined => "Declined",
        /// Accepted by the customer.
        Accepted => "Accepted",
        /// Converted into an invoice.
        Invoiced => "Invoiced",
    }
}

document_status! {
    /// Invoice payment status.
    InvoiceStatus {
        /// Not issued yet.
        Draft => "Draft",
        /// Issued, nothing paid.
        Unpaid => "Unpaid",
        /// Some but not all of the total is paid.
        PartiallyPaid => "Partially Paid",
        /// Fully paid.
        Paid => "Paid",
        /// Past due and not fully paid.
        Overdue => "Overdue",
    }
}

document_status! {
    /// Credit note status.
    CreditNoteStatus {
        /// Has remaining credit.
        Open => "Open",
        /// Fully consumed.
        Closed => "Closed",
        /// Cancelled; cannot be applied.
        Void => "Void",
    }
}

document_status! {
    /// Proposal status.
    ProposalStatus {
        /// Being prepared.
        Draft => "Draft",
        /// Sent to the lead.
        Sent => "Sent",
        /// Awaiting an answer.
        Open => "Open",
        /// Superseded by a revision.
        Revised => "Revised",
        /// Rejected.
        Declined => "Declined",
        /// Accepted or converted.
        Accepted => "Accepted",
    }
}

impl InvoiceStatus {
    /// Whether the invoice still has money owed for reporting purposes.
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        !matches!(self, Self::Draft | Self::Paid)
    }
}

impl EstimateStatus {
    /// Whether the estimate was already turned into an invoice.
    #[must_use]
    pub const fn is_converted(self) -> bool {
        matches!(self, Self::Invoiced)
    }
}

impl CreditNoteStatus {
    /// Whether credit can still be drawn from a note in this status.
    #[must_use]
    pub const fn accepts_applications(self) -> bool {
        matches!(self, Self::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_status_exact_strings() {
        let strings: Vec<&str> = InvoiceStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            strings,
            vec!["Draft", "Unpaid", "Partially Paid", "Paid", "Overdue"]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            InvoiceStatus::parse("partially paid"),
            Some(InvoiceStatus::PartiallyPaid)
        );
        assert_eq!(EstimateStatus::parse(" INVOICED "), Some(EstimateStatus::Invoiced));
        assert_eq!(CreditNoteStatus::parse("closed"), Some(CreditNoteStatus::Closed));
        assert_eq!(CreditNoteStatus::parse("spent"), None);
    }

    #[test]
    fn test_serde_uses_exact_strings() {
        let json = serde_json::to_string(&InvoiceStatus::PartiallyPaid).unwrap();
        assert_eq!(json, "\"Partially Paid\"");

        let status: ProposalStatus = serde_json::from_str("\"Revised\"").unwrap();
        assert_eq!(status, ProposalStatus::Revised);
    }

    #[test]
    fn test_outstanding_statuses() {
        assert!(InvoiceStatus::Unpaid.is_outstanding());
        assert!(InvoiceStatus::Overdue.is_outstanding());
        assert!(!InvoiceStatus::Paid.is_outstanding());
        assert!(!InvoiceStatus::Draft.is_outstanding());
    }

    #[test]
    fn test_only_open_notes_accept_applications() {
        assert!(CreditNoteStatus::Open.accepts_applications());
        assert!(!CreditNoteStatus::Closed.accepts_applications());
        assert!(!CreditNoteStatus::Void.accepts_applications());
    }
}
