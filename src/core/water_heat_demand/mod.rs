pub mod consumption_pattern;
