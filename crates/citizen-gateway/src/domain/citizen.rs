//! Citizen record requests and their chaincode invocations.
//!
//! Field names follow the JSON the web clients already send (camelCase).
//! Values are forwarded to the chaincode as strings in a fixed order.

use super::error::ApiError;
use ledger_pipeline::ChaincodeInvocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chaincode function names.
pub mod functions {
    pub const GET_CITIZEN: &str = "getCitizenCJIB";
    pub const SET_CITIZEN: &str = "setCitizen";
    pub const UPDATE_CITIZEN: &str = "updateCitizen";
    pub const DELETE_CITIZEN: &str = "deleteCitizen";
}

/// A scalar JSON value passed through as a chaincode argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

fn require_bsn(bsn: Option<&FieldValue>) -> Result<String, ApiError> {
    let bsn = bsn.map(ToString::to_string).unwrap_or_default();
    let bsn = bsn.trim();
    if bsn.is_empty() {
        return Err(ApiError::bad_request("bsn is required"));
    }
    Ok(bsn.to_string())
}

/// `GET /api/getCitizen?bsn=...&months=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitizenQuery {
    pub bsn: Option<String>,
    /// Look-back period; omitted from the call when absent.
    pub months: Option<String>,
}

impl CitizenQuery {
    pub fn into_invocation(self, chaincode_id: &str) -> Result<ChaincodeInvocation, ApiError> {
        let bsn = require_bsn(self.bsn.map(FieldValue::Text).as_ref())?;
        let mut args = vec![bsn];
        if let Some(months) = self.months.filter(|m| !m.trim().is_empty()) {
            args.push(months);
        }
        Ok(ChaincodeInvocation::new(
            chaincode_id,
            functions::GET_CITIZEN,
            args,
        ))
    }
}

/// `POST /api/createCitizen`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCitizenRequest {
    pub bsn: Option<FieldValue>,
    pub first_name: FieldValue,
    pub last_name: FieldValue,
    pub address: FieldValue,
    pub financial_support: FieldValue,
    pub fine_amount: FieldValue,
    pub consent: FieldValue,
    pub municipality_id: FieldValue,
}

impl CreateCitizenRequest {
    pub fn into_invocation(self, chaincode_id: &str) -> Result<ChaincodeInvocation, ApiError> {
        let bsn = require_bsn(self.bsn.as_ref())?;
        let args = vec![
            bsn,
            self.first_name.to_string(),
            self.last_name.to_string(),
            self.address.to_string(),
            self.financial_support.to_string(),
            self.fine_amount.to_string(),
            self.consent.to_string(),
            self.municipality_id.to_string(),
        ];
        Ok(ChaincodeInvocation::new(
            chaincode_id,
            functions::SET_CITIZEN,
            args,
        ))
    }
}

/// `PUT /api/updateCitizen`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCitizenRequest {
    pub bsn: Option<FieldValue>,
    pub financial_support: FieldValue,
}

impl UpdateCitizenRequest {
    pub fn into_invocation(self, chaincode_id: &str) -> Result<ChaincodeInvocation, ApiError> {
        let bsn = require_bsn(self.bsn.as_ref())?;
        Ok(ChaincodeInvocation::new(
            chaincode_id,
            functions::UPDATE_CITIZEN,
            vec![bsn, self.financial_support.to_string()],
        ))
    }
}

/// `DELETE /api/deleteCitizen`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCitizenRequest {
    pub bsn: Option<FieldValue>,
}

impl DeleteCitizenRequest {
    pub fn into_invocation(self, chaincode_id: &str) -> Result<ChaincodeInvocation, ApiError> {
        let bsn = require_bsn(self.bsn.as_ref())?;
        Ok(ChaincodeInvocation::new(
            chaincode_id,
            functions::DELETE_CITIZEN,
            vec![bsn],
        ))
    }
}
