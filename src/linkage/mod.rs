//! Client for Mainzelliste-compatible record-linkage services.
//!
//! Drives the service's session/token lifecycle over JSON-HTTP:
//! - open (and close) a session authorized by API key
//! - issue `addPatient` tokens, one round trip each
//! - issue a `readPatients` token, discovering invalid pseudonyms one at a
//!   time until the service accepts the remainder
//!
//! Pseudonyms and tokens are the only identifiers that cross this boundary;
//! identifying data never does.

pub mod connection;
pub mod session;
pub mod transport;

pub use connection::LinkageConnection;
pub use session::LinkageSession;
pub use transport::HttpTransport;

/// Bounded prefix of a response body for error messages. The cut lands on a
/// char boundary; service answers may carry multibyte text.
pub(crate) fn body_snippet(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
