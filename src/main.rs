#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

fn main() {
  if let Err(e) = care_watch::run() {
    eprintln!("care-watch: {}", e);
    std::process::exit(1);
  }
}
