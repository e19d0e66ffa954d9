use common::VERSION;

pub fn run() {
    println!("{VERSION}");
}
