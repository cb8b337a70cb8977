//! Things that happen on a schedule while a simulation runs:
//! reporting progress, deciding when to stop, and deciding when to
//! save.

use auto_args::AutoArgs;
use std::time;

/// The parameters to define the report information as well as stop
/// time (which is part of the report).
#[derive(AutoArgs, Debug, Clone)]
pub struct ReportParams {
    /// The maximum number of iterations to run.
    pub max_iter: Option<u64>,
    /// Do not make reports!
    pub quiet: bool,
}

impl Default for ReportParams {
    fn default() -> Self {
        ReportParams {
            max_iter: None,
            quiet: true,
        }
    }
}

/// Reports progress, and knows when the simulation is finished.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Report {
    /// Stop after this many moves.
    pub max_iter: Option<u64>,
    /// The user has requested that nothing be printed!
    pub quiet: bool,
    /// This is when and where the simulation started.
    #[serde(skip)]
    start: Option<(time::Instant, u64)>,
}

impl From<ReportParams> for Report {
    fn from(params: ReportParams) -> Self {
        Report {
            max_iter: params.max_iter,
            quiet: params.quiet,
            start: Some((time::Instant::now(), 0)),
        }
    }
}

impl Report {
    /// Allows a resuming simulation to get updated report parameters
    /// from the flags.
    pub fn update_from(&mut self, params: ReportParams) {
        self.max_iter = params.max_iter;
        self.quiet = params.quiet;
    }
    /// Have we made all the moves we were asked for?
    pub fn am_all_done(&self, moves: u64) -> bool {
        match self.max_iter {
            Some(max) => moves >= max,
            None => false,
        }
    }
    /// Print how far along we are.
    pub fn print(&mut self, moves: u64) {
        if self.quiet {
            return;
        }
        match self.start {
            Some((start_time, start_iter)) if moves > start_iter => {
                let runtime = start_time.elapsed();
                let time_per_move = duration_to_secs(runtime) / (moves - start_iter) as f64;
                if let Some(max) = self.max_iter {
                    let frac_complete = moves as f64 / max as f64;
                    let moves_left = if max >= moves { max - moves } else { 0 };
                    let time_left = (time_per_move * moves_left as f64) as u64;
                    println!(
                        "[{}] {}% complete after {} ({} left, {:.1}us per move)",
                        moves,
                        (100. * frac_complete) as isize,
                        format_duration(runtime.as_secs()),
                        format_duration(time_left),
                        time_per_move * 1e6
                    );
                } else {
                    println!(
                        "[{}] after {} ({:.1}us per move)",
                        moves,
                        format_duration(runtime.as_secs()),
                        time_per_move * 1e6
                    );
                }
            }
            Some(_) => (),
            None => {
                // We just resumed, so start timing from here.
                self.start = Some((time::Instant::now(), moves));
            }
        }
    }
}

/// The parameter to define the save schedule
#[derive(AutoArgs, Debug, Clone)]
pub struct SaveParams {
    /// Maximum time between saves in hours
    pub save_time: Option<f64>,
}

impl Default for SaveParams {
    fn default() -> Self {
        SaveParams { save_time: None }
    }
}

/// Decides when to save a checkpoint.  Without a save time we save
/// after 1, 2, 4, 8... moves.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Save {
    /// How frequently to save...
    #[serde(default)]
    save_time_seconds: Option<f64>,
    #[serde(skip)]
    next_output: u64,
    #[serde(skip)]
    start: Option<(time::Instant, u64)>,
}

impl From<SaveParams> for Save {
    fn from(params: SaveParams) -> Self {
        Save {
            save_time_seconds: params.save_time.map(|h| 60. * 60. * h),
            next_output: 1,
            start: Some((time::Instant::now(), 0)),
        }
    }
}

impl Save {
    /// Allows a resuming simulation to get updated save parameters
    /// from the flags.
    pub fn update_from(&mut self, params: SaveParams) {
        self.save_time_seconds = params.save_time.map(|h| 60. * 60. * h);
    }
    /// Is it time to save?  If so, schedule the next save.
    pub fn shall_i_save(&mut self, moves: u64) -> bool {
        if moves < self.next_output {
            return false;
        }
        match (self.save_time_seconds, self.start) {
            (Some(period), Some((start_time, start_iter))) if moves > start_iter => {
                let time_per_move =
                    duration_to_secs(start_time.elapsed()) / (moves - start_iter) as f64;
                let moves_per_period = 1 + (period / time_per_move) as u64;
                self.next_output = moves + moves_per_period;
            }
            (Some(_), _) => {
                self.start = Some((time::Instant::now(), moves));
                self.next_output = moves + (1 << 20);
            }
            (None, _) => {
                self.next_output = 2 * moves.max(1);
            }
        }
        true
    }
}

fn format_duration(secs: u64) -> String {
    let mins = secs / 60;
    let hours = mins / 60;
    let mins = mins % 60;
    if hours > 50 {
        format!("{} hours", hours)
    } else if mins < 1 && hours < 1 {
        format!("{} seconds", secs)
    } else if mins == 1 && hours < 1 {
        format!("1 minute {} seconds", secs % 60)
    } else if hours < 1 {
        format!("{} minutes", mins)
    } else if hours < 2 {
        format!("1 hour, {} minutes", mins)
    } else {
        format!("{} hours, {} minutes", hours, mins)
    }
}

fn duration_to_secs(t: time::Duration) -> f64 {
    t.as_secs() as f64 + t.subsec_nanos() as f64 * 1e-9
}

#[test]
fn durations_read_nicely() {
    assert_eq!(format_duration(5), "5 seconds");
    assert_eq!(format_duration(75), "1 minute 15 seconds");
    assert_eq!(format_duration(600), "10 minutes");
    assert_eq!(format_duration(3600), "1 hour, 0 minutes");
    assert_eq!(format_duration(3 * 3600 + 120), "3 hours, 2 minutes");
    assert_eq!(format_duration(100 * 3600), "100 hours");
}

#[test]
fn saves_double_in_spacing() {
    let mut save = Save::from(SaveParams::default());
    let saved: Vec<u64> = (0..40).filter(|&m| save.shall_i_save(m)).collect();
    assert_eq!(saved, vec![1, 2, 4, 8, 16, 32]);
}

#[test]
fn report_knows_when_to_stop() {
    let report = Report::from(ReportParams {
        max_iter: Some(10),
        quiet: true,
    });
    assert!(!report.am_all_done(9));
    assert!(report.am_all_done(10));
    assert!(!Report::from(ReportParams::default()).am_all_done(1 << 40));
}
