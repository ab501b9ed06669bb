use driverdeck_safety::Elevation;

pub fn elevation_status() -> Elevation {
    Elevation::Unsupported
}
