pub mod json_output_controller;
