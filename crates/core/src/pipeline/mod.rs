pub mod detection_executor;
pub mod group_organizer;
pub mod group_photos_use_case;
pub mod infrastructure;
