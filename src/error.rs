// =============================================================================
// error.rs — THE TAXONOMY OF THINGS THAT GO WRONG
// =============================================================================
//
// Two failure domains, strictly separated:
//
// 1. DataSourceError — the whole fetch went sideways. Network down, endpoint
//    returned HTTP 503, body wasn't JSON. The dataset stays empty and the
//    dashboard raises a flag instead of silently rendering nothing, because
//    a silently empty dashboard helps exactly nobody.
//
// 2. RecordDefect — ONE trip in the payload is broken. A missing driver name,
//    a negative distance, a request date written in interpretive dance.
//    Defective records get quarantined; the other forty-nine trips do not
//    deserve collective punishment.
//
// Could we have used one big error enum? Yes. Would that have blurred the
// line between "the load failed" and "one record is garbage"? Also yes.
// =============================================================================

use thiserror::Error;

/// The fetch itself failed. There is no dataset. There will be no dataset.
/// No retry, no backoff loop, no second chances — the dashboard stores
/// this and exposes it to the renderer.
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// The HTTP request never produced a response. DNS, TLS, a cable
    /// somewhere that a backhoe found first.
    #[error("transport failure talking to the trips endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but not with the 200 we were promised.
    #[error("trips endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The body arrived but refused to be `{ "trips": [...] }`.
    #[error("trips payload is not decodable JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One record in the payload is malformed. The record is quarantined with
/// its defect attached; decoding continues for everything else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordDefect {
    /// A field the TripRecord shape requires simply isn't there.
    /// Quarantined at decode so no substring check downstream ever meets
    /// a field that doesn't exist.
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),

    /// Distance, duration and cost are declared non-negative reals.
    /// A trip of -4.2 km is a philosophy problem, not a data point.
    #[error("record field `{field}` is negative ({value})")]
    NegativeValue { field: &'static str, value: String },

    /// The request date didn't parse under any format we accept.
    #[error("record has unparseable request date `{0}`")]
    BadTimestamp(String),

    /// A second record claimed an identifier we've already seen in this
    /// snapshot. Identifiers are unique per snapshot; the later claimant
    /// loses.
    #[error("record reuses identifier `{0}` already present in this snapshot")]
    DuplicateId(String),
}
