//! Wire types for the Twilio Verify API.

use serde::Deserialize;

/// Response body for both the verification start and check endpoints.
///
/// Only the status field matters to us; everything else in the payload
/// is ignored.
#[derive(Debug, Deserialize)]
pub struct VerificationResource {
    pub status: String,
}

impl VerificationResource {
    /// A checked code is valid iff the resource reports "approved".
    /// "pending" (wrong code) and anything else collapse to false.
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}
