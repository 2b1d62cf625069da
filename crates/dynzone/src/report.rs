//! Console rendering of engine events

use colored::Colorize;
use dynzone_core::EngineEvent;
use tokio::sync::mpsc;
use tracing::Level;

/// Turn off colors when asked to, or when NO_COLOR is set
pub fn configure_colors(no_color: bool) {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }
}

/// Status tag for an event: `[✓]` or `[✗]`
pub fn status_tag(ok: bool) -> String {
    if ok {
        format!("[{}]", "✓".green())
    } else {
        format!("[{}]", "✗".red())
    }
}

/// One rendered line for an event
pub fn render(event: &EngineEvent) -> String {
    format!("{} {}", status_tag(event.is_ok()), event)
}

/// Log every event until the engine drops its sender
pub async fn drain(mut rx: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = rx.recv().await {
        // The summary line is printed by the caller once the run returns.
        if matches!(event, EngineEvent::RunFinished { .. }) {
            continue;
        }

        let line = render(&event);
        if event.severity() == Level::ERROR {
            tracing::error!(ok = false, "{}", line);
        } else {
            tracing::info!(ok = true, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_tags_without_color() {
        colored::control::set_override(false);

        let ok = EngineEvent::RecordUpdated {
            fqdn: "home.example.com".to_string(),
            previous: "1.2.3.4".to_string(),
            ip: "5.6.7.8".to_string(),
        };
        assert_eq!(render(&ok), "[✓] Updated home.example.com to 5.6.7.8");

        let failed = EngineEvent::ZoneNotFound {
            account: "Personal".to_string(),
            zone: "missing.com".to_string(),
        };
        assert_eq!(render(&failed), "[✗] Zone missing.com not found");
    }

    #[test]
    fn dry_run_line_is_tagged_ok() {
        colored::control::set_override(false);

        let event = EngineEvent::RecordWouldUpdate {
            fqdn: "vpn.example.com".to_string(),
            previous: "1.2.3.4".to_string(),
            ip: "5.6.7.8".to_string(),
        };
        assert_eq!(
            render(&event),
            "[✓] Dry run: Would update vpn.example.com to 5.6.7.8"
        );
    }

    #[tokio::test]
    async fn drain_stops_when_sender_is_dropped() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(EngineEvent::RecordNotFound {
            fqdn: "gone.example.com".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        drain(rx).await;
    }
}
