use std::time::Instant;

use anyhow::{Context, Result};
use argparse::{ArgumentParser, StoreOption, StoreTrue};
use log::info;

use lorenz::Conf;

/// Command line overrides. Anything left as `None` keeps the value from the config file, or the
/// built-in default when there is no config file.
#[derive(Default)]
struct Overrides {
    config: Option<String>,
    output: Option<String>,
    size: Option<f64>,
    rho: Option<f64>,
    sigma: Option<f64>,
    beta: Option<f64>,
    x_init: Option<f64>,
    y_init: Option<f64>,
    z_init: Option<f64>,
    precision: Option<f64>,
    iterations: Option<usize>,
    step: Option<u8>,
    thread_count: Option<usize>,
    print_config: bool,
}

impl Overrides {
    fn apply(&self, c: &mut Conf) {
        if let Some(ref v) = self.output {
            c.output = v.clone();
        }
        if let Some(v) = self.size {
            c.size = v;
        }
        if let Some(v) = self.rho {
            c.rho = v;
        }
        if let Some(v) = self.sigma {
            c.sigma = v;
        }
        if let Some(v) = self.beta {
            c.beta = v;
        }
        if let Some(v) = self.x_init {
            c.x_init = v;
        }
        if let Some(v) = self.y_init {
            c.y_init = v;
        }
        if let Some(v) = self.z_init {
            c.z_init = v;
        }
        if let Some(v) = self.precision {
            c.precision = v;
        }
        if let Some(v) = self.iterations {
            c.iterations = v;
        }
        if let Some(v) = self.step {
            c.step = v;
        }
        if let Some(v) = self.thread_count {
            c.thread_count = v;
        }
    }

    fn conf(&self) -> Result<Conf> {
        let mut c = match self.config {
            Some(ref path) => Conf::from_json_file(path)
                .with_context(|| format!("Failed to load config file '{}'", path))?,
            None => Conf::default(),
        };
        self.apply(&mut c);
        Ok(c)
    }
}

fn parse_args() -> Overrides {
    let mut o = Overrides::default();
    {
        let mut argparse = ArgumentParser::new();
        argparse.set_description(
            "Integrate the Lorenz equations and write the attractor as a grayscale PNG. \
             Without arguments the built-in defaults are used and 'lorenz.png' is written.",
        );
        argparse.refer(&mut o.config).add_option(
            &["-c", "--config"],
            StoreOption,
            "JSON file with settings; fields it leaves out keep their defaults",
        );
        argparse.refer(&mut o.output).add_option(
            &["-o", "--output"],
            StoreOption,
            "Path of the output image (default 'lorenz.png')",
        );
        argparse.refer(&mut o.size).add_option(
            &["--size"],
            StoreOption,
            "Length in pixels of the longer side of the image (default 800, at most 65535)",
        );
        argparse.refer(&mut o.rho).add_option(&["--rho"], StoreOption, "Rho (default 28)");
        argparse
            .refer(&mut o.sigma)
            .add_option(&["--sigma"], StoreOption, "Sigma (default 10)");
        argparse.refer(&mut o.beta).add_option(
            &["--beta"],
            StoreOption,
            "Beta (default 2; the textbook attractor uses 2.6666666666666665)",
        );
        argparse
            .refer(&mut o.x_init)
            .add_option(&["--x-init"], StoreOption, "Initial x (default 0)");
        argparse.refer(&mut o.y_init).add_option(
            &["--y-init"],
            StoreOption,
            "Initial y (default -4, pass as --y-init=-4)",
        );
        argparse
            .refer(&mut o.z_init)
            .add_option(&["--z-init"], StoreOption, "Initial z (default 23)");
        argparse.refer(&mut o.precision).add_option(
            &["--precision"],
            StoreOption,
            "Each step advances time by 1/precision (default 1000)",
        );
        argparse.refer(&mut o.iterations).add_option(
            &["--iterations"],
            StoreOption,
            "Number of integration steps (default 2000000)",
        );
        argparse.refer(&mut o.step).add_option(
            &["--step"],
            StoreOption,
            "Brightness added per hit, saturating at 255 (default 8)",
        );
        argparse.refer(&mut o.thread_count).add_option(
            &["-t", "--threads"],
            StoreOption,
            "Number of threads used to accumulate pixels (default 1)",
        );
        argparse.refer(&mut o.print_config).add_option(
            &["--print-config"],
            StoreTrue,
            "Print the effective configuration as JSON and exit",
        );
        argparse.parse_args_or_exit();
    }
    o
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let overrides = parse_args();
    let conf = overrides.conf()?;

    if overrides.print_config {
        println!("{}", serde_json::to_string_pretty(&conf)?);
        return Ok(());
    }
    info!("Rendering with {}", conf);

    let started = Instant::now();
    let canvas = lorenz::render(&conf).context("Failed to render the attractor")?;
    canvas
        .write_png(&conf.output)
        .with_context(|| format!("Failed to write '{}'", conf.output))?;
    info!(
        "Wrote {}x{} image to {} ({:?} total)",
        canvas.width(),
        canvas.height(),
        conf.output,
        started.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_overrides_means_reference_defaults() {
        assert_eq!(Overrides::default().conf().unwrap(), Conf::default());
    }

    #[test]
    fn overrides_replace_only_what_they_name() {
        let o = Overrides {
            beta: Some(8.0 / 3.0),
            thread_count: Some(4),
            output: Some("out.png".to_string()),
            ..Overrides::default()
        };
        let c = o.conf().unwrap();
        assert_eq!(c.beta, 8.0 / 3.0);
        assert_eq!(c.thread_count, 4);
        assert_eq!(c.output, "out.png");
        assert_eq!(c.rho, 28.0);
        assert_eq!(c.iterations, 2_000_000);
    }

    #[test]
    fn missing_config_file_names_the_path() {
        let o = Overrides {
            config: Some("/definitely/not/here.json".to_string()),
            ..Overrides::default()
        };
        let err = o.conf().unwrap_err();
        assert!(format!("{}", err).contains("/definitely/not/here.json"));
    }
}
