mod test_create_room_scenario;
mod test_local_media_denied;
mod test_room_errors;
