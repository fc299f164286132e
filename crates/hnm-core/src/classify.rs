// ── Link medium classification ──

use crate::model::LinkMedium;

/// Infer the physical medium of a link from its interface label.
///
/// Case-insensitive substring match, first rule wins: `sfpplus`/`10g` is
/// ten-gig, any other `sfp` is one-gig, `wlan`/`wifi` is wireless and
/// everything else is copper ethernet.
pub fn classify(label: &str) -> LinkMedium {
    let label = label.to_lowercase();
    if label.contains("sfpplus") || label.contains("10g") {
        LinkMedium::TenGig
    } else if label.contains("sfp") {
        LinkMedium::OneGig
    } else if label.contains("wlan") || label.contains("wifi") {
        LinkMedium::Wireless
    } else {
        LinkMedium::Ethernet
    }
}
