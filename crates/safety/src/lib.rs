#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    Elevated,
    NotElevated,
    /// The host has no elevation concept we can query.
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct SafetyContext {
    pub export_requested: bool,
    pub elevation: Elevation,
}

#[derive(Debug, Clone)]
pub enum SafetyDecision {
    Allow,
    Deny(String),
}

pub fn can_export_drivers(ctx: &SafetyContext) -> SafetyDecision {
    if !ctx.export_requested {
        return SafetyDecision::Allow;
    }

    match ctx.elevation {
        Elevation::Elevated => SafetyDecision::Allow,
        Elevation::NotElevated => SafetyDecision::Deny(
            "Denied: driver export requires an elevated (administrator) session; \
             rerun elevated or pass --skip-export"
                .to_string(),
        ),
        // The exporter reports its own platform error.
        Elevation::Unsupported => SafetyDecision::Allow,
    }
}
