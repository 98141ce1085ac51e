fn main() {
    if let Err(err) = excalidraw_md::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
