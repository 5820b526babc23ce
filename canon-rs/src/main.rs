use canon_compute::fmt::DisplayMode;
use canon_compute::pipeline::{evaluate, PipelineError};
use canon_compute::reduce::ReductionContext;
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{fs::File, io::{self, BufReader, IsTerminal, Read}};

/// The fixed size of the output buffer. Input or output that does not fit is rejected, the way
/// a calculator's display line would reject it.
const OUTPUT_BUFFER_SIZE: usize = 256;

/// Evaluates one expression and prints the canonical result, or reports the failure to stderr.
fn run_line(input: &str, ctx: &ReductionContext) {
    let mut buf = [0u8; OUTPUT_BUFFER_SIZE];
    match evaluate(input, ctx, &mut buf) {
        Ok(len) => {
            // the renderer only emits ASCII
            println!("{}", std::str::from_utf8(&buf[..len]).unwrap());
        },
        Err(PipelineError::Parse(err)) => {
            canon_error::Error::from(err)
                .report_to_stderr("input", input)
                .unwrap();
        },
        Err(err) => eprintln!("{}", err),
    }
}

/// Evaluates each non-empty line of the input.
fn run_all(input: &str, ctx: &ReductionContext) {
    for line in input.lines() {
        if !line.trim().is_empty() {
            run_line(line, ctx);
        }
    }
}

fn main() {
    let mut ctx = ReductionContext::default();
    let mut filename = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--extra-rules" => ctx.extra_rules = true,
            "--scientific" => ctx.display_mode = DisplayMode::Scientific,
            _ => filename = Some(arg),
        }
    }

    if let Some(filename) = filename {
        // run source file, one expression per line
        let mut file = BufReader::new(File::open(filename).unwrap());
        let mut input = String::new();
        file.read_to_string(&mut input).unwrap();

        run_all(&input, &ctx);
    } else if !io::stdin().is_terminal() {
        // read source from stdin
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).unwrap();

        run_all(&input, &ctx);
    } else {
        // run the repl / interactive mode
        let mut rl = DefaultEditor::new().unwrap();

        fn process_line(rl: &mut DefaultEditor, ctx: &ReductionContext) -> Result<(), ReadlineError> {
            let input = rl.readline("> ")?;
            if input.trim().is_empty() {
                return Ok(());
            }

            rl.add_history_entry(&input)?;

            run_line(&input, ctx);
            Ok(())
        }

        loop {
            if let Err(err) = process_line(&mut rl, &ctx) {
                match err {
                    ReadlineError::Eof | ReadlineError::Interrupted => (),
                    _ => eprintln!("{}", err),
                }
                break;
            }
        }
    }
}
