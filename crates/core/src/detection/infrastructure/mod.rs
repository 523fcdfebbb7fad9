pub mod json_face_detector;
