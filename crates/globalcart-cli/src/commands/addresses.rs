use clap::{Args, Subcommand};
use globalcart_core::model::{Address, AddressId, NewAddress};

use super::Context;

#[derive(Subcommand, Debug)]
pub enum AddressesCmd {
  List,
  Add(AddressFields),
  Update {
    address_id: AddressId,
    #[command(flatten)]
    fields:     AddressFields,
  },
  Delete { address_id: AddressId },
}

#[derive(Args, Debug)]
pub struct AddressFields {
  #[arg(long)]
  label:   Option<String>,
  #[arg(long)]
  name:    String,
  #[arg(long)]
  phone:   String,
  #[arg(long)]
  line1:   String,
  #[arg(long, default_value = "")]
  line2:   String,
  #[arg(long)]
  city:    String,
  #[arg(long)]
  state:   String,
  #[arg(long)]
  postal:  String,
  #[arg(long, default_value = Address::DEFAULT_COUNTRY)]
  country: String,
  /// Make this the default shipping address.
  #[arg(long)]
  default: bool,
}

impl From<AddressFields> for NewAddress {
  fn from(f: AddressFields) -> Self {
    NewAddress {
      label:      f.label,
      address:    Address {
        recipient_name: f.name,
        phone:          f.phone,
        address_line1:  f.line1,
        address_line2:  f.line2,
        city:           f.city,
        state:          f.state,
        postal_code:    f.postal,
        country:        f.country,
      },
      is_default: f.default,
    }
  }
}

pub async fn run(ctx: &Context, cmd: AddressesCmd) -> anyhow::Result<()> {
  let customer = ctx.require_customer()?;
  let cid = customer.customer_id;
  match cmd {
    AddressesCmd::List => {
      let list = ctx.api.addresses(cid).await?;
      if list.is_empty() {
        println!("No saved addresses.");
      }
      for a in list {
        println!("#{:<5} {}", a.address_id, a.summary());
      }
    }
    AddressesCmd::Add(fields) => {
      let saved = ctx.api.create_address(cid, &fields.into()).await?;
      println!("Saved #{}: {}", saved.address_id, saved.summary());
    }
    AddressesCmd::Update { address_id, fields } => {
      let saved = ctx.api.update_address(cid, address_id, &fields.into()).await?;
      println!("Updated #{}: {}", saved.address_id, saved.summary());
    }
    AddressesCmd::Delete { address_id } => {
      ctx.api.delete_address(cid, address_id).await?;
      println!("Deleted #{address_id}.");
    }
  }
  Ok(())
}
