//! Child-process plumbing shared by the executors.
//!
//! Stdin is fed, stdout/stderr are drained, and the child is waited on all
//! at once. Doing these one after another deadlocks as soon as the child
//! fills an OS pipe buffer.

use std::process::{ExitStatus, Stdio};

use tokio::io::{self, AsyncRead, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::application::ports::{InputStream, OutputSink};

/// The streams of one command, detached so they can be moved into the pumps.
pub struct Streams<'a> {
    pub stdin: Option<InputStream<'a>>,
    pub stdout: Option<OutputSink<'a>>,
    pub stderr: Option<OutputSink<'a>>,
}

/// How a child finished.
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    /// First failure copying to or from the attached streams.
    pub streams: io::Result<()>,
}

/// Spawn `command` with pipes for the attached streams.
///
/// Unattached stdin reads as empty; unattached output is discarded. The
/// child is killed if its handle is dropped before it is reaped.
///
/// # Errors
///
/// Returns the OS error if the process cannot be started.
pub fn spawn(command: &mut Command, streams: &Streams<'_>) -> io::Result<Child> {
    let piped_if = |attached: bool| if attached { Stdio::piped() } else { Stdio::null() };
    command
        .stdin(piped_if(streams.stdin.is_some()))
        .stdout(piped_if(streams.stdout.is_some()))
        .stderr(piped_if(streams.stderr.is_some()))
        .kill_on_drop(true)
        .spawn()
}

/// Pump `streams` through `child` and wait for it to exit.
///
/// A `BrokenPipe` while feeding stdin means the child stopped reading; it is
/// not an error by itself, the exit status decides. Every stream is dropped
/// before this returns.
///
/// # Errors
///
/// Returns an error only if waiting on the child fails.
pub async fn drive(mut child: Child, streams: Streams<'_>) -> io::Result<Finished> {
    let Streams {
        stdin,
        stdout,
        stderr,
    } = streams;
    let child_stdin = child.stdin.take();
    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let feed = async move {
        let (Some(mut input), Some(mut pipe)) = (stdin, child_stdin) else {
            return Ok(());
        };
        match io::copy(&mut input, &mut pipe).await {
            Ok(_) => pipe.shutdown().await.or_else(ignore_broken_pipe),
            Err(e) => ignore_broken_pipe(e),
        }
    };

    let (status, fed, out, err) = tokio::join!(
        child.wait(),
        feed,
        drain(child_stdout, stdout),
        drain(child_stderr, stderr),
    );

    Ok(Finished {
        status: status?,
        streams: fed.and(out).and(err),
    })
}

fn ignore_broken_pipe(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::BrokenPipe {
        Ok(())
    } else {
        Err(e)
    }
}

/// Copy `pipe` into `sink` until end of stream.
///
/// If the sink fails, the rest of the pipe is still read and discarded so the
/// child never stalls on a full pipe.
async fn drain<R: AsyncRead + Unpin>(
    pipe: Option<R>,
    sink: Option<OutputSink<'_>>,
) -> io::Result<()> {
    let (Some(mut pipe), Some(mut sink)) = (pipe, sink) else {
        return Ok(());
    };
    match io::copy(&mut pipe, &mut sink).await {
        Ok(_) => sink.flush().await,
        Err(e) => {
            drop(sink);
            io::copy(&mut pipe, &mut io::sink()).await?;
            Err(e)
        }
    }
}
