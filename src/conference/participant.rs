//! Participant records and endpoint identifier extraction

use crate::signaling::engine::ParticipantInfo;

/// A remote participant at one point in time
///
/// This is a value record, not a live handle: two lookups of the same
/// endpoint compare equal when the underlying details have not changed, and
/// a retained record does not keep the participant alive in any sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Full signalling address
    pub jid: String,
    /// Display name, if advertised
    pub nick: Option<String>,
    /// Conference-scoped endpoint identifier
    pub endpoint_id: String,
}

impl From<ParticipantInfo> for Participant {
    fn from(info: ParticipantInfo) -> Self {
        Self {
            jid: info.jid,
            nick: info.nick,
            endpoint_id: info.endpoint_id,
        }
    }
}

/// Extract the owner endpoint id from a media stream identifier
///
/// Stream identifiers are formed as `<endpoint_id>-<suffix>`; the owner is
/// everything before the first `-`. An identifier without a separator is
/// taken as the endpoint id whole.
pub(crate) fn endpoint_id_from_stream(stream_id: &str) -> &str {
    stream_id.split('-').next().unwrap_or(stream_id)
}
