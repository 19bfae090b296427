//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: Database entity representing one ledger entry
//! - `TransactionDetails`: a transaction joined with its category and account names
//! - Request types for expense, income, transfer and update operations
//! - Response types returned to clients

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::category::CategoryKind;
use crate::models::money::parse_amount;

/// Kind of a transaction. Fixed at creation; the update path never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }

    /// Category kind a transaction of this kind may reference. Transfers take none.
    pub fn category_kind(&self) -> Option<CategoryKind> {
        match self {
            Self::Expense => Some(CategoryKind::Expense),
            Self::Income => Some(CategoryKind::Income),
            Self::Transfer => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown transaction type: {0:?}")]
pub struct UnknownTransactionKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer" => Ok(Self::Transfer),
            other => Err(UnknownTransactionKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for TransactionKind {
    type Error = UnknownTransactionKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Represents a transaction record from the database.
///
/// # Amount Storage
///
/// `amount` is always a positive magnitude. The direction of the balance
/// change is implied by `kind` and applied only while adjusting balances.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    pub id: i64,

    pub user_id: i64,

    /// Primary account (the source account of a transfer)
    pub account_id: i64,

    /// Destination account; present only for transfers
    pub related_account_id: Option<i64>,

    pub category_id: Option<i64>,

    #[sqlx(rename = "type", try_from = "String")]
    pub kind: TransactionKind,

    pub amount: Decimal,

    /// Copied from the primary account when the row is written
    pub currency: String,

    pub description: Option<String>,

    /// User-supplied date of the operation; listings filter and sort on it
    pub operation_date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// Values for a new transaction row. The store assigns the id and creation time.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub user_id: i64,
    pub account_id: i64,
    pub related_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub operation_date: DateTime<Utc>,
}

/// A transaction joined with the names shown in listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionDetails {
    #[sqlx(flatten)]
    pub transaction: Transaction,

    pub category_name: Option<String>,

    pub account_name: Option<String>,
}

/// Request to record an expense or an income.
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": 7,
///   "amount": "30.00",
///   "category_id": 3,
///   "description": "Lunch",
///   "operation_date": "2025-12-21T13:00:00+03:00"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub account_id: i64,
    pub amount: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub operation_date: Option<String>,
}

/// Request to move money between two of the caller's accounts.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub operation_date: Option<String>,
}

/// Request to amend a transaction.
///
/// `related_account_id` may only be sent for transfers; when omitted the
/// stored destination is kept.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    pub account_id: i64,
    pub amount: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub operation_date: Option<String>,
    #[serde(default)]
    pub related_account_id: Option<i64>,
}

/// Query string of `GET /api/v1/transactions`.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    pub period: Option<String>,
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Response returned for expense, income and update operations.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub transaction_id: i64,
    pub account_balance: Decimal,
    pub status: &'static str,
}

/// Response returned for transfers, with both resulting balances.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub transaction_id: i64,
    pub from_account_balance: Decimal,
    pub to_account_balance: Decimal,
    pub status: &'static str,
}

/// One row of a transaction listing.
#[derive(Debug, Serialize)]
pub struct TransactionListItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub currency: String,
    pub category_name: String,
    pub account_name: String,
    pub operation_date: DateTime<Utc>,
    pub description: String,
    pub account_id: i64,
    pub related_account_id: Option<i64>,
    pub category_id: Option<i64>,
}

impl From<TransactionDetails> for TransactionListItem {
    fn from(details: TransactionDetails) -> Self {
        let tx = details.transaction;
        Self {
            id: tx.id,
            kind: tx.kind,
            amount: tx.amount,
            currency: tx.currency,
            category_name: details.category_name.unwrap_or_default(),
            account_name: details.account_name.unwrap_or_default(),
            operation_date: tx.operation_date,
            description: tx.description.unwrap_or_default(),
            account_id: tx.account_id,
            related_account_id: tx.related_account_id,
            category_id: tx.category_id,
        }
    }
}

/// A validated expense or income, ready for the ledger service.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub account_id: i64,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub operation_date: DateTime<Utc>,
}

impl TryFrom<EntryRequest> for NewEntry {
    type Error = AppError;

    fn try_from(req: EntryRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: req.account_id,
            amount: parse_amount(&req.amount)?,
            category_id: optional_ref(req.category_id),
            description: optional_text(req.description),
            operation_date: parse_operation_date(req.operation_date.as_deref(), Utc::now()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
    pub operation_date: DateTime<Utc>,
}

impl TryFrom<TransferRequest> for NewTransfer {
    type Error = AppError;

    fn try_from(req: TransferRequest) -> Result<Self, Self::Error> {
        if req.from_account_id == req.to_account_id {
            return Err(AppError::invalid("cannot transfer to the same account"));
        }

        Ok(Self {
            from_account_id: req.from_account_id,
            to_account_id: req.to_account_id,
            amount: parse_amount(&req.amount)?,
            description: optional_text(req.description),
            operation_date: parse_operation_date(req.operation_date.as_deref(), Utc::now()),
        })
    }
}

/// The replacement values of an amended transaction.
///
/// `category_id: None` clears the category; `related_account_id: None` keeps
/// the stored destination of a transfer.
#[derive(Debug, Clone)]
pub struct TransactionEdit {
    pub account_id: i64,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub operation_date: DateTime<Utc>,
    pub related_account_id: Option<i64>,
}

impl TryFrom<UpdateTransactionRequest> for TransactionEdit {
    type Error = AppError;

    fn try_from(req: UpdateTransactionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: req.account_id,
            amount: parse_amount(&req.amount)?,
            category_id: optional_ref(req.category_id),
            description: optional_text(req.description),
            operation_date: parse_operation_date(req.operation_date.as_deref(), Utc::now()),
            related_account_id: optional_ref(req.related_account_id),
        })
    }
}

/// Resolve a client-supplied operation date.
///
/// RFC 3339 with an offset is the accepted profile. Anything empty or
/// unparseable falls back to `now`.
pub fn parse_operation_date(input: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    input
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|date| date.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Gateways send `0` for "no reference"; treat it like an absent id.
pub fn optional_ref(id: Option<i64>) -> Option<i64> {
    id.filter(|id| *id > 0)
}

/// Empty descriptions are stored as NULL.
pub fn optional_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn operation_date_accepts_offsets() {
        let now = Utc::now();
        let parsed = parse_operation_date(Some("2025-03-01T10:00:00+03:00"), now);
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn operation_date_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_operation_date(None, now), now);
        assert_eq!(parse_operation_date(Some(""), now), now);
        assert_eq!(parse_operation_date(Some("yesterday"), now), now);
        assert_eq!(parse_operation_date(Some("2025-03-01"), now), now);
    }

    #[test]
    fn self_transfer_is_rejected_before_parsing_the_amount() {
        let req = TransferRequest {
            from_account_id: 3,
            to_account_id: 3,
            amount: "10".to_string(),
            description: None,
            operation_date: None,
        };
        assert!(matches!(
            NewTransfer::try_from(req),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn edit_normalizes_optional_fields() {
        let req = UpdateTransactionRequest {
            account_id: 1,
            amount: "12,50".to_string(),
            category_id: Some(0),
            description: Some("  ".to_string()),
            operation_date: Some("2025-06-01T00:00:00Z".to_string()),
            related_account_id: None,
        };
        let edit = TransactionEdit::try_from(req).unwrap();

        assert_eq!(edit.amount.to_string(), "12.50");
        assert_eq!(edit.category_id, None);
        assert_eq!(edit.description, None);
        assert_eq!(edit.operation_date, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn entry_rejects_non_positive_amounts() {
        let req = EntryRequest {
            account_id: 1,
            amount: "0".to_string(),
            category_id: None,
            description: None,
            operation_date: None,
        };
        assert!(NewEntry::try_from(req).is_err());
    }

    #[test]
    fn zero_references_are_absent() {
        assert_eq!(optional_ref(Some(0)), None);
        assert_eq!(optional_ref(None), None);
        assert_eq!(optional_ref(Some(12)), Some(12));
    }

    #[test]
    fn blank_descriptions_are_dropped() {
        assert_eq!(optional_text(Some("   ".to_string())), None);
        assert_eq!(optional_text(Some(" coffee ".to_string())), Some("coffee".to_string()));
    }

    #[test]
    fn only_expense_and_income_take_categories() {
        assert_eq!(
            TransactionKind::Expense.category_kind(),
            Some(CategoryKind::Expense)
        );
        assert_eq!(
            TransactionKind::Income.category_kind(),
            Some(CategoryKind::Income)
        );
        assert_eq!(TransactionKind::Transfer.category_kind(), None);
    }

    #[test]
    fn list_item_fills_missing_names_with_empty_strings() {
        let details = TransactionDetails {
            transaction: Transaction {
                id: 5,
                user_id: 1,
                account_id: 2,
                related_account_id: None,
                category_id: None,
                kind: TransactionKind::Expense,
                amount: Decimal::new(1250, 2),
                currency: "RUB".to_string(),
                description: None,
                operation_date: Utc::now(),
                created_at: Utc::now(),
            },
            category_name: None,
            account_name: Some("Main".to_string()),
        };

        let item = TransactionListItem::from(details);
        assert_eq!(item.category_name, "");
        assert_eq!(item.account_name, "Main");
        assert_eq!(item.amount.to_string(), "12.50");
    }
}
