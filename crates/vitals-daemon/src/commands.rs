//! One-shot reminder management commands.

use anyhow::Context;
use vitals_core::UserId;
use vitals_reminders::{NewReminder, ReminderStore, ReminderUpdate, StoredReminder};

pub fn add(
    store: &ReminderStore,
    user: &UserId,
    category: &str,
    time: Option<&str>,
    active: bool,
) -> anyhow::Result<()> {
    let new = NewReminder::parse(category, time, active)?;
    let reminder = store.create(user, new).context("creating reminder")?;
    println!("{}", format_row(&reminder));
    Ok(())
}

pub fn list(store: &ReminderStore, user: &UserId, active_only: bool, json: bool) -> anyhow::Result<()> {
    let reminders = if active_only {
        store.list_active(user)?
    } else {
        store.list(user)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reminders)?);
    } else if reminders.is_empty() {
        println!("{}", empty_message(active_only));
    } else {
        for reminder in &reminders {
            println!("{}", format_row(reminder));
        }
    }
    Ok(())
}

pub fn edit(
    store: &ReminderStore,
    user: &UserId,
    id: &str,
    update: ReminderUpdate,
) -> anyhow::Result<()> {
    let reminder = store
        .update(user, id, update)
        .with_context(|| format!("editing reminder {id}"))?;
    println!("{}", format_row(&reminder));
    Ok(())
}

pub fn remove(store: &ReminderStore, user: &UserId, id: &str) -> anyhow::Result<()> {
    store
        .delete(user, id)
        .with_context(|| format!("removing reminder {id}"))?;
    println!("removed {id}");
    Ok(())
}

fn empty_message(active_only: bool) -> &'static str {
    if active_only {
        "Nenhum lembrete ativo."
    } else {
        "Nenhum lembrete cadastrado."
    }
}

/// `<id>  💧 Água às 08:00  ativo`
fn format_row(reminder: &StoredReminder) -> String {
    format!(
        "{}  {} às {}  {}",
        reminder.id,
        reminder.category.display_name(),
        reminder.time,
        if reminder.active { "ativo" } else { "inativo" }
    )
}
