//! Map catalog and endpoint naming.

/// Every map of the world conquest, by canonical name.
pub const AVAILABLE_MAPS: [&str; 43] = [
    "Acrithia", "AllodsBight", "AshFields", "BasinSionnach", "CallahansPassage",
    "CallumsCape", "Clahstra", "ClansheadValley", "DeadLands", "DrownedVale",
    "EndlessShore", "FarranacCoast", "FishermansRow", "Godcrofts", "GreatMarch",
    "Heartlands", "HowlCounty", "Kalokai", "KingsCage", "LinnMercy", "LochMor",
    "MarbanHollow", "MooringCounty", "MorgensCrossing", "NevishLine", "Oarbreaker",
    "Origin", "ReachingTrail", "ReaversPass", "RedRiver", "Sableport",
    "ShackledChasm", "SpeakingWoods", "StemaLanding", "StlicanShelf", "Stonecradle",
    "TempestIsland", "Terminus", "TheFingers", "UmbralWildwood", "ViperPit",
    "WeatheredExpanse", "Westgate",
];

/// The one map the API addresses without the `Hex` suffix.
const UNSUFFIXED_MAP: &str = "MarbanHollow";

/// Convert a canonical map name to the name the API expects.
///
/// `Origin` becomes `OriginHex`; `MarbanHollow` is used as is.
pub fn to_endpoint_name(map_name: &str) -> String {
    if map_name == UNSUFFIXED_MAP {
        map_name.to_string()
    } else {
        format!("{}Hex", map_name)
    }
}

/// Inverse of [`to_endpoint_name`]; canonical names pass through unchanged.
pub fn canonical_map_name(name: &str) -> &str {
    name.strip_suffix("Hex").unwrap_or(name)
}

/// The catalog as owned names.
pub fn catalog() -> Vec<String> {
    AVAILABLE_MAPS.iter().map(|m| m.to_string()).collect()
}

// Endpoint keys, relative to the API base. Keys are case-sensitive and
// accept either name form.

fn api_name(map_name: &str) -> String {
    to_endpoint_name(canonical_map_name(map_name))
}

pub fn dynamic_map_endpoint(map_name: &str) -> String {
    format!("maps/{}/dynamic/public", api_name(map_name))
}

pub fn static_map_endpoint(map_name: &str) -> String {
    format!("maps/{}/static", api_name(map_name))
}

pub fn war_report_endpoint(map_name: &str) -> String {
    format!("warReport/{}", api_name(map_name))
}

pub const WAR_ENDPOINT: &str = "war";
