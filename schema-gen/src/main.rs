use schemars::schema_for;
use solar_thermal_sim::input::SimulationRequest;

fn main() {
    let schema = schema_for!(SimulationRequest);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
