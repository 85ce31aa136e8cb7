//! Client-side form validation. The server re-validates everything.

use crate::{
  error::{Error, Field, Result, Rule},
  model::Address,
};

pub const MIN_PASSWORD_LEN: usize = 7;

fn all_digits(s: &str, n: usize) -> bool {
  s.len() == n && s.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a typed shipping address. Fields are checked in form order and
/// the first failure is returned.
pub fn address(addr: &Address) -> Result<()> {
  let a = addr.trimmed();
  let required = [
    (Field::RecipientName, &a.recipient_name),
    (Field::Phone, &a.phone),
    (Field::AddressLine1, &a.address_line1),
    (Field::City, &a.city),
    (Field::State, &a.state),
    (Field::PostalCode, &a.postal_code),
    (Field::Country, &a.country),
  ];
  for (field, value) in required {
    if value.is_empty() {
      return Err(Error::validation(field, Rule::Required));
    }
    match field {
      Field::Phone if !all_digits(value, 10) => {
        return Err(Error::validation(field, Rule::TenDigits));
      }
      Field::PostalCode if !all_digits(value, 6) => {
        return Err(Error::validation(field, Rule::SixDigits));
      }
      _ => {}
    }
  }
  Ok(())
}

/// Trimmed, lowercased email. Blank input is rejected.
pub fn email(raw: &str) -> Result<String> {
  let e = raw.trim().to_lowercase();
  if e.is_empty() {
    return Err(Error::validation(Field::Email, Rule::Required));
  }
  Ok(e)
}

pub fn otp(raw: &str) -> Result<String> {
  let o = raw.trim();
  if o.is_empty() {
    return Err(Error::validation(Field::Otp, Rule::Required));
  }
  Ok(o.to_owned())
}

/// Signup password rules: at least seven characters with an uppercase
/// letter, a digit and a special character, confirmed exactly.
pub fn new_password(password: &str, confirm: &str) -> Result<()> {
  if password.is_empty() {
    return Err(Error::validation(Field::Password, Rule::Required));
  }
  let strong = password.chars().count() >= MIN_PASSWORD_LEN
    && password.chars().any(|c| c.is_ascii_uppercase())
    && password.chars().any(|c| c.is_ascii_digit())
    && password.chars().any(|c| !c.is_ascii_alphanumeric());
  if !strong {
    return Err(Error::validation(Field::Password, Rule::TooWeak));
  }
  if password != confirm {
    return Err(Error::validation(Field::ConfirmPassword, Rule::Mismatch));
  }
  Ok(())
}

pub fn rating(r: u8) -> Result<u8> {
  if (1..=5).contains(&r) {
    Ok(r)
  } else {
    Err(Error::validation(Field::Rating, Rule::OutOfRange))
  }
}
