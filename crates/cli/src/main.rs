fn main() -> Result<(), Box<dyn std::error::Error>> {
    alphabeta_cli::run()
}
