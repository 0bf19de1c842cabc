//! `sys_crashtest <n>`: deliberately crashes the process in one of several
//! ways so the crash handling of a deployment can be checked.
//!
//! Parsing and dispatch live here. The faults themselves are behind
//! [`FaultInjector`] so they can be observed without taking the process down.

use log::warn;

pub const COMMAND_NAME: &str = "sys_crashtest";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    NullPointerWrite,
    IntDivisionByZero,
    OutOfMemoryBig,
    EngineError,
    OutOfMemorySmall,
    AssertionFailure,
    DebugBreak,
    Abort,
    InvalidCrtArgument,
    PureVirtualCall,
    UncaughtException,
    StackOverflow,
    Exit,
}

impl Fault {
    /// In selector order, starting at 1.
    pub const ALL: [Fault; 13] = [
        Fault::NullPointerWrite,
        Fault::IntDivisionByZero,
        Fault::OutOfMemoryBig,
        Fault::EngineError,
        Fault::OutOfMemorySmall,
        Fault::AssertionFailure,
        Fault::DebugBreak,
        Fault::Abort,
        Fault::InvalidCrtArgument,
        Fault::PureVirtualCall,
        Fault::UncaughtException,
        Fault::StackOverflow,
        Fault::Exit,
    ];

    pub fn from_selector(selector: i32) -> Option<Fault> {
        let index = usize::try_from(selector).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn selector(self) -> i32 {
        Self::ALL.iter().position(|f| *f == self).map_or(0, |i| i as i32 + 1)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Fault::NullPointerWrite => "null pointer write",
            Fault::IntDivisionByZero => "integer division by zero",
            Fault::OutOfMemoryBig => "out of memory (16 MiB blocks)",
            Fault::EngineError => "engine error",
            Fault::OutOfMemorySmall => "out of memory (128 byte blocks)",
            Fault::AssertionFailure => "assertion failure",
            Fault::DebugBreak => "debug break",
            Fault::Abort => "abort",
            Fault::InvalidCrtArgument => "invalid CRT argument",
            Fault::PureVirtualCall => "pure virtual call",
            Fault::UncaughtException => "uncaught exception",
            Fault::StackOverflow => "stack overflow",
            Fault::Exit => "exit(13)",
        }
    }
}

/// Help text shown by the console for the command.
pub fn help_text() -> String {
    let mut help = format!("Usage: {COMMAND_NAME} <n>");
    for fault in Fault::ALL {
        help.push_str(&format!("\n{:>2} = {}", fault.selector(), fault.describe()));
    }
    help
}

/// The console's view of one command invocation.
pub trait CommandArgs {
    /// Includes the command name itself.
    fn arg_count(&self) -> usize;
    fn arg(&self, index: usize) -> Option<String>;
    fn command_line(&self) -> String;
}

pub trait WarningSink {
    fn warning(&mut self, message: &str);
}

pub trait FaultInjector {
    fn inject(&mut self, fault: Fault);
}

/// C `atoi`: leading whitespace, optional sign, then as many digits as there
/// are. Anything else yields 0.
pub fn parse_c_int(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| (acc * 10 + i64::from(d - b'0')).min(i64::from(i32::MAX) + 1));
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Handles one `sys_crashtest` invocation. Returns the fault that was
/// injected, if any; bad input only produces a warning.
pub fn handle_command(
    args: &dyn CommandArgs,
    sink: &mut dyn WarningSink,
    injector: &mut dyn FaultInjector,
) -> Option<Fault> {
    if args.arg_count() != 2 {
        let message = format!("'{}' requires one argument", args.command_line());
        warn!("{message}");
        sink.warning(&message);
        return None;
    }

    let selector = parse_c_int(&args.arg(1).unwrap_or_default());
    let Some(fault) = Fault::from_selector(selector) else {
        let message = format!("{COMMAND_NAME} {selector} is not supported");
        warn!("{message}");
        sink.warning(&message);
        return None;
    };

    warn!("{COMMAND_NAME}: triggering {}", fault.describe());
    injector.inject(fault);
    Some(fault)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Args(Vec<&'static str>);

    impl CommandArgs for Args {
        fn arg_count(&self) -> usize {
            self.0.len()
        }

        fn arg(&self, index: usize) -> Option<String> {
            self.0.get(index).map(|s| s.to_string())
        }

        fn command_line(&self) -> String {
            self.0.join(" ")
        }
    }

    #[derive(Default)]
    struct Recorder {
        warnings: Vec<String>,
        faults: Vec<Fault>,
    }

    impl WarningSink for Recorder {
        fn warning(&mut self, message: &str) {
            self.warnings.push(message.to_owned());
        }
    }

    struct Faults<'a>(&'a mut Vec<Fault>);

    impl FaultInjector for Faults<'_> {
        fn inject(&mut self, fault: Fault) {
            self.0.push(fault);
        }
    }

    fn run(args: &[&'static str]) -> (Option<Fault>, Recorder) {
        let mut recorder = Recorder::default();
        let mut faults = Vec::new();
        let result = handle_command(&Args(args.to_vec()), &mut recorder, &mut Faults(&mut faults));
        recorder.faults = faults;
        (result, recorder)
    }

    #[test]
    fn selector_two_divides_by_zero() {
        let (fault, recorder) = run(&["sys_crashtest", "2"]);
        assert_eq!(fault, Some(Fault::IntDivisionByZero));
        assert_eq!(recorder.faults, vec![Fault::IntDivisionByZero]);
        assert!(recorder.warnings.is_empty());
    }

    #[test]
    fn unsupported_selector_only_warns() {
        let (fault, recorder) = run(&["sys_crashtest", "99"]);
        assert_eq!(fault, None);
        assert!(recorder.faults.is_empty());
        assert_eq!(recorder.warnings, vec!["sys_crashtest 99 is not supported"]);

        let (_, recorder) = run(&["sys_crashtest", "abc"]);
        assert_eq!(recorder.warnings, vec!["sys_crashtest 0 is not supported"]);
    }

    #[test]
    fn wrong_argument_count() {
        for args in [&["sys_crashtest"][..], &["sys_crashtest", "1", "2"][..]] {
            let (fault, recorder) = run(args);
            assert_eq!(fault, None);
            assert!(recorder.faults.is_empty());
            assert_eq!(recorder.warnings, vec![format!("'{}' requires one argument", args.join(" "))]);
        }
    }

    #[test]
    fn every_selector_maps_to_one_fault() {
        for (i, fault) in Fault::ALL.iter().enumerate() {
            assert_eq!(Fault::from_selector(i as i32 + 1), Some(*fault));
            assert_eq!(fault.selector(), i as i32 + 1);
        }
        assert_eq!(Fault::from_selector(0), None);
        assert_eq!(Fault::from_selector(-1), None);
        assert_eq!(Fault::from_selector(14), None);
        assert_eq!(Fault::from_selector(13), Some(Fault::Exit));
    }

    #[test]
    fn atoi_semantics() {
        assert_eq!(parse_c_int("7"), 7);
        assert_eq!(parse_c_int("  12abc"), 12);
        assert_eq!(parse_c_int("+3"), 3);
        assert_eq!(parse_c_int("-4"), -4);
        assert_eq!(parse_c_int("x1"), 0);
        assert_eq!(parse_c_int(""), 0);
        assert_eq!(parse_c_int("99999999999"), i32::MAX);
    }

    #[test]
    fn help_lists_every_selector() {
        let help = help_text();
        assert!(help.starts_with("Usage: sys_crashtest <n>"));
        assert!(help.contains(" 2 = integer division by zero"));
        assert!(help.contains("13 = exit(13)"));
        assert_eq!(help.lines().count(), 14);
    }
}
