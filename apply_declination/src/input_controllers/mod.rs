pub mod json_input_controller;
