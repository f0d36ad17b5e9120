//! Wordlist Generator - candidate list generation for penetration testing
//!
//! Main entry point for the command-line application.

use anyhow::Context;
use bytesize::ByteSize;
use clap::Parser;
use std::process;
use std::sync::Arc;

use wordlist_generator::cli::Args;
use wordlist_generator::context::{CancellationToken, RunContext};
use wordlist_generator::plan::GenerationConfig;
use wordlist_generator::processor::{print_outcome, Generator, RunSettings};
use wordlist_generator::progress::{
    print_banner, print_error, print_header, print_info, BarReporter, NullReporter,
    ProgressReporter,
};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        std::env::set_var("RUST_LOG", "debug");
    } else if !args.quiet {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    // Configure thread pool
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        let mut source = e.source();
        while let Some(err) = source {
            print_error(&format!("  Caused by: {}", err));
            source = err.source();
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    if !args.quiet {
        print_banner();
    }

    let config = args.generation_config()?;
    let rules = args.transform_rules();
    let settings = args.run_settings()?;

    if !args.quiet && args.verbose {
        print_config(&args, &config, &settings);
    }

    let reporter: Arc<dyn ProgressReporter> = if settings.dry_run {
        Arc::new(NullReporter)
    } else {
        Arc::new(BarReporter::new(0, args.quiet))
    };

    // Ctrl-C / SIGTERM stop generation cleanly instead of killing the writer
    let token = CancellationToken::new();
    if let Err(e) = ctrlc::set_handler(token.interrupt_handler()) {
        log::warn!("Failed to install interrupt handler: {}", e);
    }

    let ctx = RunContext::new(reporter)
        .with_token(token)
        .with_progress_interval(args.parse_progress_interval()?);

    if !args.quiet {
        print_header("Generating...");
    }
    let outcome = Generator::new(config, rules, settings)
        .run(&ctx)
        .context("Generation failed")?;

    if !args.quiet {
        print_outcome(&outcome);
    }

    Ok(())
}

/// Print configuration summary
fn print_config(args: &Args, config: &GenerationConfig, settings: &RunSettings) {
    print_header("Configuration");

    if let Some(ref mask) = config.mask {
        print_info(&format!("Mask:         {}", mask));
    }
    if let Some(ref charset) = config.charset {
        print_info(&format!("Charset:      {}", charset));
        print_info(&format!("Lengths:      {:?}", config.length_range));
    }
    if let Some(ref tokens) = config.tokens {
        print_info(&format!("Tokens:       {} ({:?})", tokens, config.token_mode));
    }
    if let Some(ref pattern) = config.pattern_charset {
        print_info(&format!("Pattern:      {} ({:?})", pattern, config.pattern_type));
    }
    if let Some(ref dictionary) = config.dictionary {
        print_info(&format!("Dictionary:   {:?}", dictionary));
        print_info(&format!("Combine:      {:?}", config.combine));
        print_info(&format!("Append:       {:?}", config.append));
    }

    print_info(&format!("Output:       {:?}", settings.output));
    print_info(&format!("Split size:   {}", settings.split_size));
    print_info(&format!("Batch size:   {}", settings.writer.batch_size));
    print_info(&format!("Buffer size:  {}", ByteSize(settings.writer.buffer_size as u64)));
    print_info(&format!("Threads:      {}", args.threads.unwrap_or_else(num_cpus::get)));
}
