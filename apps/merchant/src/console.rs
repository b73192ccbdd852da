//! # Merchant Console
//!
//! Line-oriented surface over the commands. One task drives everything:
//! it waits on either the next input line or the next scanner action, so a
//! form is never touched from two places at once.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  loop {                                                                 │
//! │    select! {                     (only cancel-safe waits race here)     │
//! │      line   = stdin        ──► execute(line)        ──► print replies   │
//! │      action = scanner      ──► on_scan_action       ──► print notice    │
//! │      ctrl-c                ──► stop scanner, quit                       │
//! │    }                                                                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers run after the race is decided, so a scanned card's submit is
//! never dropped halfway; input typed meanwhile waits for it to settle.

use std::path::Path;
use std::sync::Arc;

use aliados_core::scan::ScanAction;
use aliados_core::{BusinessId, Notice, NoticeKind, RegistrationMethod};
use aliados_gateway::Gateway;
use aliados_scan::Scanner;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use crate::commands::{redeem, register, scan, SubmitOutcome, View};
use crate::state::{RedeemState, RegisterState, SessionState};

pub const HELP: &str = "\
Commands:
  view redeem|register|register-qr   switch view
  offers                             reload active offers (redeem view)
  offer <id>                         select an offer; `offer` alone clears it
  card <text>                        type into the card field
  submit                             submit the form
  clear                              clear the card field
  cameras                            list cameras
  camera <id>                        select a camera
  scan | stop                        start or stop the camera
  image <path>                       read a QR code from an image file
  login <business id> | logout       manage the stored session
  status                             show the current form
  help | quit";

/// What the loop does after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(Vec<String>),
    Quit,
}

pub struct Console {
    gateway: Arc<dyn Gateway>,
    session: SessionState,
    redeem: RedeemState,
    register_manual: RegisterState,
    register_qr: RegisterState,
    view: View,
    scanner: Scanner,
}

fn render(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Error => "error",
        NoticeKind::Info => "info",
    };
    format!("[{}] {}", tag, notice.message)
}

fn render_outcome(outcome: SubmitOutcome) -> Vec<String> {
    match outcome {
        SubmitOutcome::Ignored => vec!["[info] A submission is already in progress.".into()],
        SubmitOutcome::Rejected(err) => vec![format!("[error] {}", err.message)],
        SubmitOutcome::Settled(notice) => vec![render(&notice)],
    }
}

impl Console {
    pub fn new(gateway: Arc<dyn Gateway>, session: SessionState, scanner: Scanner) -> Self {
        let redeem = RedeemState::new();
        Console {
            gateway,
            session,
            view: View::Redeem(redeem.clone()),
            redeem,
            register_manual: RegisterState::new(RegistrationMethod::Manual),
            register_qr: RegisterState::new(RegistrationMethod::Qr),
            scanner,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Loads the offer selector for the redemption view.
    pub async fn load_offers(&self) -> Vec<String> {
        match redeem::load_offers(self.gateway.as_ref(), &self.session, &self.redeem).await {
            Ok(_) => self.offer_lines(),
            Err(err) => vec![format!("[error] {}", err.message)],
        }
    }

    fn offer_lines(&self) -> Vec<String> {
        self.redeem.with_form(|form| {
            let list = form.offers();
            if list.offers().is_empty() {
                return vec![format!("Offers: {}", list.placeholder())];
            }
            let mut lines = vec![format!("Offers ({}):", list.placeholder())];
            lines.extend(list.offers().iter().map(|o| {
                let marker = if form.selected_offer() == Some(o.id) { '*' } else { ' ' };
                format!(" {} {:>5}  {}", marker, o.id.to_string(), o.title)
            }));
            lines
        })
    }

    fn status_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("View: {}", self.view.name()),
            format!("Card: {}", self.view.card_input()),
        ];
        if let View::Redeem(_) = self.view {
            lines.extend(self.offer_lines());
        }
        if self.view.is_busy() {
            lines.push("Submitting...".into());
        }
        if let Some(device) = self.scanner.active_device() {
            lines.push(format!("Scanning with {}", device));
        }
        if let Some(notice) = self.view.notice() {
            lines.push(render(&notice));
        }
        lines
    }

    async fn switch_view(&mut self, name: &str) -> Vec<String> {
        let view = match name {
            "redeem" => View::Redeem(self.redeem.clone()),
            "register" => View::Register(self.register_manual.clone()),
            "register-qr" => View::Register(self.register_qr.clone()),
            _ => return vec![format!("[error] Unknown view: {}", name)],
        };
        scan::stop_scan(&mut self.scanner).await;
        self.view = view;
        info!(view = self.view.name(), "View switched");
        self.status_lines()
    }

    /// Runs one input line.
    pub async fn execute(&mut self, line: &str) -> Step {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };
        debug!(command, "Console command");

        let lines = match command {
            "" => Vec::new(),
            "help" => HELP.lines().map(str::to_string).collect(),
            "quit" | "exit" => {
                scan::stop_scan(&mut self.scanner).await;
                return Step::Quit;
            }
            "view" => self.switch_view(arg).await,
            "status" => self.status_lines(),
            "offers" => self.load_offers().await,
            "offer" => match redeem::select_offer(&self.redeem, arg) {
                Ok(()) => self.offer_lines(),
                Err(err) => vec![format!("[error] {}", err.message)],
            },
            "card" => {
                let cursor = self.view.type_card(arg, arg.len());
                vec![format!("Card: {} (cursor {})", self.view.card_input(), cursor)]
            }
            "clear" => {
                match &self.view {
                    View::Redeem(state) => state.with_form_mut(|form| {
                        if !form.is_busy() {
                            form.set_card_input("");
                            form.clear_notice();
                        }
                    }),
                    View::Register(state) => register::clear_registration(state),
                }
                self.status_lines()
            }
            "submit" => {
                let outcome = self.view.submit(self.gateway.as_ref(), &self.session).await;
                render_outcome(outcome)
            }
            "cameras" => match scan::list_cameras(&mut self.scanner).await {
                Ok(devices) => {
                    let selected = self.scanner.session().selected_device().map(str::to_string);
                    devices
                        .iter()
                        .map(|d| {
                            let marker = if selected.as_deref() == Some(d.id.as_str()) { '*' } else { ' ' };
                            format!(" {} {}  {}", marker, d.id, d.label)
                        })
                        .collect()
                }
                Err(err) => vec![format!("[error] {}", err.message)],
            },
            "camera" => match scan::select_camera(&mut self.scanner, arg).await {
                Ok(()) => vec![format!("Camera: {}", arg)],
                Err(err) => vec![format!("[error] {}", err.message)],
            },
            "scan" => match scan::start_scan(&mut self.scanner, &self.view).await {
                Ok(()) => vec!["Scanning... show the card's QR code to the camera.".into()],
                Err(err) => vec![format!("[error] {}", err.message)],
            },
            "stop" => {
                scan::stop_scan(&mut self.scanner).await;
                vec!["Scanner stopped.".into()]
            }
            "image" => {
                let verdict = scan::decode_image(&self.scanner, Path::new(arg), &self.view).await;
                let mut lines = vec![format!("Card: {}", self.view.card_input())];
                lines.push(render(&verdict.notice()));
                lines
            }
            "login" => match arg.parse::<BusinessId>() {
                Ok(id) => match self.session.sign_in(id).await {
                    Ok(()) => {
                        let mut lines = vec![format!("Signed in as business {}", id)];
                        lines.extend(self.load_offers().await);
                        lines
                    }
                    Err(err) => vec![format!("[error] {}", err)],
                },
                Err(err) => vec![format!("[error] {}", err)],
            },
            "logout" => match self.session.sign_out().await {
                Ok(()) => vec!["Signed out.".into()],
                Err(err) => vec![format!("[error] {}", err)],
            },
            other => vec![format!("[error] Unknown command: {} (try `help`)", other)],
        };

        Step::Continue(lines)
    }

    /// Applies a scanner action to the view, submitting on a hand-off.
    async fn on_scan_action(&mut self, action: ScanAction) -> Vec<String> {
        let outcome = scan::handle_scan_action(
            &mut self.scanner,
            action,
            &self.view,
            self.gateway.as_ref(),
            &self.session,
        )
        .await;

        match outcome {
            Some(outcome) => render_outcome(outcome),
            None => {
                let mut lines = vec![format!("Card: {}", self.view.card_input())];
                lines.extend(self.view.notice().filter(Notice::is_error).map(|n| render(&n)));
                lines
            }
        }
    }

    /// Reads commands from stdin until `quit`, end of input, or Ctrl-C.
    pub async fn run(mut self) -> std::io::Result<()> {
        print_lines(&["Aliados merchant console. Type `help` for commands.".to_string()]);
        print_lines(&self.load_offers().await);

        let input = BufReader::new(tokio::io::stdin()).lines();
        let result = self.event_loop(input).await;

        scan::stop_scan(&mut self.scanner).await;
        result
    }

    async fn event_loop<R>(&mut self, mut input: Lines<R>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                line = input.next_line() => {
                    let Some(line) = line? else { break };
                    match self.execute(&line).await {
                        Step::Continue(lines) => print_lines(&lines),
                        Step::Quit => break,
                    }
                }
                action = next_scan_action(&mut self.scanner), if self.scanner.is_scanning() => {
                    let lines = self.on_scan_action(action).await;
                    print_lines(&lines);
                }
                _ = &mut interrupted => {
                    info!("Interrupted");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Next scanner action; pends forever once no camera is attached.
async fn next_scan_action(scanner: &mut Scanner) -> ScanAction {
    match scanner.next_action().await {
        Some(action) => action,
        None => std::future::pending().await,
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use aliados_core::notice::REDEEM_SUCCESS;
    use aliados_scan::{CameraDevice, CameraProvider, FrameSource, RqrrDecoder, ScanResult};
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::Notify;

    use crate::commands::testing::{
        offers, signed_in, signed_out, FakeGateway, OneCamera, TextDecoder,
    };

    struct NoCameras;

    #[async_trait]
    impl CameraProvider for NoCameras {
        async fn list_devices(&self) -> ScanResult<Vec<CameraDevice>> {
            Ok(Vec::new())
        }

        async fn open(&self, device_id: &str) -> ScanResult<Box<dyn FrameSource>> {
            Err(aliados_scan::CameraAccessError::DeviceNotFound(device_id.to_string()).into())
        }
    }

    fn console(gateway: Arc<FakeGateway>) -> Console {
        let scanner = Scanner::new(Arc::new(NoCameras), Arc::new(RqrrDecoder::new()), "http://localhost");
        Console::new(gateway, signed_out(), scanner)
    }

    fn lines(step: Step) -> Vec<String> {
        match step {
            Step::Continue(lines) => lines,
            Step::Quit => panic!("console quit"),
        }
    }

    #[tokio::test]
    async fn test_login_select_and_redeem() {
        let gateway = Arc::new(FakeGateway::with_offers(offers()));
        let mut console = console(gateway.clone());

        let out = lines(console.execute("login 42").await);
        assert_eq!(out[0], "Signed in as business 42");
        assert!(out.iter().any(|l| l.contains("2x1 Coffee")));

        lines(console.execute("offer 7").await);
        let out = lines(console.execute("card 4111 1111 1111 1111").await);
        assert_eq!(out[0], "Card: 4111-1111-1111-1111 (cursor 19)");

        let out = lines(console.execute("submit").await);
        assert_eq!(out, vec![format!("[ok] {}", REDEEM_SUCCESS)]);
        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 1);
        assert_eq!(console.view().card_input(), "");
    }

    #[tokio::test]
    async fn test_submit_while_signed_out() {
        let gateway = Arc::new(FakeGateway::with_offers(offers()));
        let mut console = console(gateway.clone());

        let out = lines(console.execute("submit").await);
        assert_eq!(
            out,
            vec!["[error] Authentication error: could not identify the business.".to_string()]
        );
        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_views_keep_their_own_fields() {
        let mut console = console(Arc::new(FakeGateway::default()));

        lines(console.execute("card 1234").await);
        let out = lines(console.execute("view register-qr").await);
        assert_eq!(out[0], "View: register-qr");
        assert_eq!(out[1], "Card: ");

        lines(console.execute("card 5555").await);
        lines(console.execute("view redeem").await);
        assert_eq!(console.view().card_input(), "1234");
    }

    #[tokio::test]
    async fn test_insecure_origin_blocks_scan() {
        let mut console = console(Arc::new(FakeGateway::default()));
        let scanner = Scanner::new(
            Arc::new(NoCameras),
            Arc::new(RqrrDecoder::new()),
            "http://portal.example",
        );
        console.scanner = scanner;

        let out = lines(console.execute("scan").await);
        assert!(out[0].starts_with("[error] Camera access requires HTTPS"));
    }

    #[tokio::test]
    async fn test_unknown_and_quit() {
        let mut console = console(Arc::new(FakeGateway::default()));
        let out = lines(console.execute("dance").await);
        assert!(out[0].contains("Unknown command: dance"));
        assert_eq!(console.execute("quit").await, Step::Quit);
    }

    /// A line typed while a scanned card is being redeemed waits for the
    /// redemption to settle instead of abandoning it.
    #[tokio::test]
    async fn test_input_during_scanned_redemption_waits_for_it() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(FakeGateway::with_offers(offers()).gated(gate.clone()));
        let scanner = Scanner::new(
            Arc::new(OneCamera::new(&["", "4111 1111 1111 1111"])),
            Arc::new(TextDecoder),
            "https://portal.example",
        );
        let mut console = Console::new(gateway.clone(), signed_in(42), scanner);
        console.load_offers().await;
        lines(console.execute("offer 7").await);
        lines(console.execute("scan").await);

        let (mut keyboard, stdin) = tokio::io::duplex(256);
        let typist = {
            let gateway = gateway.clone();
            let gate = gate.clone();
            async move {
                while gateway.redeem_calls.load(Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                keyboard.write_all(b"status\n").await.unwrap();
                tokio::time::sleep(Duration::from_millis(50)).await;
                gate.notify_one();
                keyboard.write_all(b"quit\n").await.unwrap();
            }
        };

        let (result, ()) = tokio::join!(
            console.event_loop(BufReader::new(stdin).lines()),
            typist
        );
        result.unwrap();

        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 1);
        assert!(!console.view().is_busy());
        assert_eq!(console.view().notice(), Some(Notice::success(REDEEM_SUCCESS)));
        assert_eq!(console.view().card_input(), "");

        // The form takes the next card normally.
        gate.notify_one();
        lines(console.execute("offer 7").await);
        lines(console.execute("card 4111111111111111").await);
        let out = lines(console.execute("submit").await);
        assert_eq!(out, vec![format!("[ok] {}", REDEEM_SUCCESS)]);
        assert_eq!(gateway.redeem_calls.load(Ordering::SeqCst), 2);
    }
}
