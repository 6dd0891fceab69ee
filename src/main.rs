fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = postfeed_tui::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Post Feed {}", postfeed_tui::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Post Feed: browse DummyJSON posts from the terminal.\n\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message\n  --logout             Forget the saved session and exit"
                );
                saw_flag = true;
            }
            "--logout" => {
                saw_flag = true;
                match postfeed_tui::app::logout_once() {
                    Ok(true) => println!("Signed out."),
                    Ok(false) => println!("No saved session."),
                    Err(err) => {
                        eprintln!("Logout failed: {err:?}");
                        std::process::exit(1);
                    }
                }
            }
            _ => {}
        }
    }
    saw_flag
}
