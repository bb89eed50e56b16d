//! `studio notifications`: list, mark read, or watch the unread count.

use anyhow::Result;
use console::style;
use studio::SessionEvent;
use studio::notify::NotificationPoller;

use super::App;

pub async fn cmd_notifications(
    app: &App,
    watch: bool,
    read: Option<i64>,
    read_all: bool,
) -> Result<()> {
    app.user().await?;
    let api = app.api().notifications();

    if let Some(id) = read {
        api.mark_as_read(id).await?;
        println!("Notification #{} marked as read.", id);
        return Ok(());
    }
    if read_all {
        api.mark_all_as_read().await?;
        println!("All notifications marked as read.");
        return Ok(());
    }
    if watch {
        return watch_unread(app).await;
    }

    let items = api.list().await?;
    if items.is_empty() {
        println!("No notifications.");
    }
    for n in &items {
        let marker = if n.is_read {
            style("·").dim()
        } else {
            style("•").yellow().bold()
        };
        let when = n
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{} {} {} {}",
            marker,
            style(format!("#{}", n.id)).cyan(),
            n.title,
            style(when).dim()
        );
        if !n.message.is_empty() {
            println!("    {}", n.message);
        }
    }
    Ok(())
}

async fn watch_unread(app: &App) -> Result<()> {
    let poller = NotificationPoller::spawn(app.client.clone(), app.config.poll_interval);
    let mut snapshots = poller.subscribe();
    let mut session_events = app.client.session().subscribe();
    println!(
        "Watching notifications every {}s. Press Ctrl-C to stop.",
        app.config.poll_interval.as_secs()
    );

    let mut last_unread = None;
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let unread = poller.unread();
                if last_unread != Some(unread) {
                    println!("{} unread", style(unread).bold());
                    last_unread = Some(unread);
                }
            }
            event = session_events.recv() => {
                if let Ok(SessionEvent::Expired) = event {
                    println!("Session expired. Run 'studio login' to sign in again.");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    poller.stop();
    Ok(())
}
