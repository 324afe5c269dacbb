use alphabeta_core::AnnotationConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let schema = schemars::schema_for!(AnnotationConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
