use php_syntax::{Parser, SourceFile};
use std::fs;
use std::process::ExitCode;

/// Debug helper: parse a file and dump the AST.
fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: dump-ast <file>");
        return ExitCode::FAILURE;
    };

    let src = match fs::read(&path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("error: {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let mut parser = Parser::new(&src, false, 0);
    match parser.parse_program() {
        Ok(program) => {
            println!("{:#?}", program);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let file = SourceFile::new(path, src);
            eprintln!("Parse error: {}", err.render(&file));
            ExitCode::FAILURE
        }
    }
}
