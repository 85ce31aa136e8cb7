use clap::Subcommand;
use globalcart_client::account::OtpSent;

use super::{Context, prompt_secret};

#[derive(Subcommand, Debug)]
pub enum AccountCmd {
  /// Show who is signed in.
  Whoami,
  /// Demo sign-in by email only.
  Resolve { email: String },
  /// Sign in with email and password.
  Login {
    email:    String,
    /// Read from stdin when omitted.
    #[arg(long, env = "GLOBALCART_PASSWORD")]
    password: Option<String>,
  },
  /// Email a one-time code for passwordless sign-in.
  RequestOtp { email: String },
  /// Finish a passwordless sign-in.
  VerifyOtp { email: String, otp: String },
  /// Start a new account; a code is emailed to finish it.
  Signup {
    #[arg(long)]
    name:     String,
    email:    String,
    #[arg(long, env = "GLOBALCART_PASSWORD")]
    password: Option<String>,
  },
  /// Finish signing up with the emailed code.
  SignupVerify { email: String, otp: String },
  /// Check whether an account exists for an email.
  Exists { email: String },
  /// Forget the signed-in customer. The cart is kept.
  Logout,
  /// Emails the store has sent you.
  Emails {
    #[arg(long, default_value_t = 50)]
    limit: u32,
  },
}

pub async fn run(ctx: &Context, cmd: AccountCmd) -> anyhow::Result<()> {
  let api = &ctx.api;
  match cmd {
    AccountCmd::Whoami => match ctx.customer() {
      Some(c) => println!("{}", c.label()),
      None => println!("Guest"),
    },
    AccountCmd::Resolve { email } => signed_in(&api.resolve(&email).await?),
    AccountCmd::Login { email, password } => {
      let password = prompt_secret("Password", password)?;
      signed_in(&api.login(&email, &password).await?);
    }
    AccountCmd::RequestOtp { email } => otp_sent(&api.request_otp(&email).await?),
    AccountCmd::VerifyOtp { email, otp } => signed_in(&api.verify_otp(&email, &otp).await?),
    AccountCmd::Signup { name, email, password } => {
      let password = prompt_secret("Password", password)?;
      let confirm = prompt_secret("Confirm password", None)?;
      otp_sent(&api.signup_request_otp(&name, &email, &password, &confirm).await?);
    }
    AccountCmd::SignupVerify { email, otp } => {
      signed_in(&api.signup_verify_otp(&email, &otp).await?)
    }
    AccountCmd::Exists { email } => {
      let exists = api.email_exists(&email).await?;
      println!("{}", if exists { "Account exists." } else { "No account for that email." });
    }
    AccountCmd::Logout => {
      api.sign_out();
      println!("Signed out.");
    }
    AccountCmd::Emails { limit } => {
      let customer = ctx.require_customer()?;
      let emails = api.emails(customer.customer_id, limit).await?;
      if emails.is_empty() {
        println!("No emails yet.");
      }
      for e in emails {
        println!("[{}] {} · {} · {}", e.status, e.created_at, e.kind, e.subject);
      }
    }
  }
  Ok(())
}

fn signed_in(customer: &globalcart_core::model::Customer) {
  println!("Signed in as {}", customer.label());
}

fn otp_sent(out: &OtpSent) {
  println!("Code sent to {} (valid for {}s).", out.email, out.expires_in_seconds);
  if let Some(code) = &out.demo_otp {
    println!("Demo code: {code}");
  }
}
