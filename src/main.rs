fn main() -> std::process::ExitCode {
    ncmodloader_lib::run()
}
