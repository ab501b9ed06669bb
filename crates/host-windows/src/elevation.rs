use driverdeck_safety::Elevation;
use windows::Win32::UI::Shell::IsUserAnAdmin;

pub fn elevation_status() -> Elevation {
    let elevated = unsafe { IsUserAnAdmin() };
    if elevated.as_bool() {
        Elevation::Elevated
    } else {
        Elevation::NotElevated
    }
}
