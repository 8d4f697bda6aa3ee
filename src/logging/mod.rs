use std::{
    ffi::OsStr,
    fmt::Display,
    io::{self, Write as _},
    os::fd::AsFd as _,
    time::SystemTime,
};

use anstyle::{AnsiColor, Effects, Style};
use env_logger::{Builder, Env, fmt::Formatter};
use log::{Level, Record};

pub fn init() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if stderr_is_journal() {
        builder.format(journal_format);
    } else {
        builder.format(terminal_format);
    }
    builder.init();
}

fn journal_format(buf: &mut Formatter, record: &Record) -> io::Result<()> {
    writeln!(
        buf,
        "<{}>{}: {}",
        syslog_priority(record.level()),
        record.target(),
        record.args()
    )
}

fn terminal_format(buf: &mut Formatter, record: &Record) -> io::Result<()> {
    let subtle = AnsiColor::BrightBlack.on_default();
    let level = level_style(record.level());
    write!(buf, "{subtle}[{subtle:#}")?;
    match jiff::Timestamp::try_from(SystemTime::now()) {
        Ok(now) => write!(buf, "{now:.3} ")?,
        Err(_) => write!(buf, "timestamp_error ")?,
    }
    write!(buf, "{level}{}{level:#} {}", record.level(), record.target())?;
    if let Some(line) = record.line() {
        write!(buf, ":{line}")?;
    }
    writeln!(buf, "{subtle}]{subtle:#} {}", record.args())
}

fn syslog_priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug | Level::Trace => 7,
    }
}

fn level_style(level: Level) -> Style {
    match level {
        Level::Error => AnsiColor::Red.on_default().effects(Effects::BOLD),
        Level::Warn => AnsiColor::Yellow.on_default(),
        Level::Info => AnsiColor::Green.on_default(),
        Level::Debug => AnsiColor::Blue.on_default(),
        Level::Trace => AnsiColor::Cyan.on_default(),
    }
}

// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

// Original code found here:
// https://github.com/swsnr/systemd-journal-logger.rs/blob/v2.2.1/src/lib.rs#L76

/// systemd sets `$JOURNAL_STREAM` to `<dev>:<inode>` of the stream it hands
/// to a service, see `systemd.exec(5)`.
fn stderr_is_journal() -> bool {
    let Some(journal_stream) = std::env::var_os("JOURNAL_STREAM") else {
        return false;
    };
    rustix::fs::fstat(io::stderr().as_fd())
        .is_ok_and(|stat| matches_stream(&journal_stream, stat.st_dev, stat.st_ino))
}

fn matches_stream(journal_stream: &OsStr, device: impl Display, inode: impl Display) -> bool {
    journal_stream.to_str() == Some(format!("{device}:{inode}").as_str())
}
