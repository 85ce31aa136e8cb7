//! The customer's address book.

use globalcart_core::{
  model::{AddressId, CustomerId, NewAddress, SavedAddress},
  validate,
};
use serde_json::Value;

use crate::{ApiClient, RequestOptions, Result};

fn owner(customer_id: CustomerId) -> RequestOptions {
  RequestOptions::new().query("customer_id", customer_id)
}

impl ApiClient {
  pub async fn addresses(&self, customer_id: CustomerId) -> Result<Vec<SavedAddress>> {
    self.get("/addresses", owner(customer_id)).await
  }

  pub async fn create_address(
    &self,
    customer_id: CustomerId,
    address: &NewAddress,
  ) -> Result<SavedAddress> {
    let address = NewAddress { address: address.address.trimmed(), ..address.clone() };
    validate::address(&address.address)?;
    self.post("/addresses", &address, owner(customer_id)).await
  }

  pub async fn update_address(
    &self,
    customer_id: CustomerId,
    address_id: AddressId,
    address: &NewAddress,
  ) -> Result<SavedAddress> {
    let address = NewAddress { address: address.address.trimmed(), ..address.clone() };
    validate::address(&address.address)?;
    self.put(&format!("/addresses/{address_id}"), &address, owner(customer_id)).await
  }

  pub async fn delete_address(&self, customer_id: CustomerId, address_id: AddressId) -> Result<()> {
    let _: Value = self.delete(&format!("/addresses/{address_id}"), owner(customer_id)).await?;
    Ok(())
  }
}
