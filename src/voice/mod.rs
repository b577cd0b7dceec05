//! Voice I/O module
//!
//! Speech capture and speech-to-text run in a separate web service fed by
//! the occupant's phone; this module talks to it over HTTP, waits for usable
//! transcripts, and hands replies back to it for text-to-speech.

mod capture;
mod delivery;
mod poller;

use std::time::Duration;

pub use capture::{
    CHECK_PATH, HttpSpeechCapture, InteractionStatus, SpeechSource, TRANSCRIBE_PATH,
};
pub use delivery::{
    DELIVERY_PATH, HttpSpeechDelivery, SpeechSink, disseminate, split_annotation,
};
pub use poller::{PollResult, TranscriptFilter, TranscriptionPoller};

use crate::Result;

/// Build the HTTP client shared by the capture and delivery clients
///
/// Every request is bounded by `timeout` so a hung speech service costs one
/// poll or one delivery, never the session.
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built
pub fn speech_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
