//! The `cirrus` binary. All behaviour lives in the library; see [`cirrus::cli`].

fn main() {
    std::process::exit(cirrus::cli::run());
}
