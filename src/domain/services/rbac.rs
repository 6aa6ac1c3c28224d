pub mod roles {
    pub const ADMIN: &str = "ADMIN";
    pub const MANAGER: &str = "MANAGER";
    pub const MEMBER: &str = "MEMBER";
}

pub fn can_edit_availability(role: &str) -> bool {
    role == roles::ADMIN || role == roles::MANAGER
}

pub fn can_manage_bookings(role: &str) -> bool {
    role == roles::ADMIN || role == roles::MANAGER
}
