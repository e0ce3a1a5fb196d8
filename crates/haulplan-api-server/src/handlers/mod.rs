pub mod system_handlers;
pub mod truck_assignment_handlers;
