//! Command-line schema for the notify-manager binary.

use clap::{Parser, Subcommand};
use notify_manager::api::models::{NotificationType, Priority};

#[derive(Parser, Debug)]
#[command(name = "notify-manager")]
#[command(about = "Compose and send Home Assistant push notifications")]
#[command(version)]
pub struct Cli {
    /// Log hub and cache fallbacks to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store the hub URL and a long-lived access token
    Login {
        #[arg(long)]
        url: String,
        #[arg(long)]
        token: String,
    },
    /// List devices that can receive notifications
    Devices,
    /// Manage notification templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Manage device groups
    Groups {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Compose and send a notification
    Send(SendArgs),
}

#[derive(Subcommand, Debug)]
pub enum TemplateAction {
    List,
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupAction {
    List,
    Create {
        name: String,
        #[arg(required = true)]
        devices: Vec<String>,
    },
    /// Add the device to the group, or remove it if already a member
    Toggle { group: String, device: String },
    Delete {
        id: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Start from a saved template
    #[arg(long)]
    pub template: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short = 'm')]
    pub message: Option<String>,
    #[arg(long = "type", value_enum)]
    pub kind: Option<NotificationType>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// Button preset: confirm_dismiss, yes_no, alarm_response, door_response, reply
    #[arg(long)]
    pub buttons: Option<String>,
    #[arg(long, conflicts_with = "device")]
    pub group: Option<String>,
    /// Target device; repeat for several. All devices when omitted
    #[arg(long)]
    pub device: Vec<String>,
    #[arg(long)]
    pub camera: Option<String>,
    #[arg(long)]
    pub click_action: Option<String>,
    /// Also store the composed notification as a template with this name
    #[arg(long)]
    pub save_as: Option<String>,
}
