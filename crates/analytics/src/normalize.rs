//! Pure translation from catalog/cart domain types into the GA4 ecommerce
//! shapes. No state, no failure cases; empty input produces an empty item
//! list with value 0.

use shopfront_core::types::{CartLine, Product};

use crate::events::{EcommerceItem, EcommerceParams};

/// Map a product to an ecommerce item. Quantity defaults to 1.
pub fn item_from_product(product: &Product, quantity: Option<u32>) -> EcommerceItem {
    EcommerceItem {
        item_id: product.id.clone(),
        item_name: product.name.clone(),
        price: Some(product.price),
        quantity: Some(quantity.unwrap_or(1)),
        item_category: product.category.clone(),
        item_brand: product.brand.clone(),
        item_variant: None,
        index: None,
    }
}

/// Map a cart line to an ecommerce item using the line's own quantity.
pub fn item_from_line(line: &CartLine) -> EcommerceItem {
    item_from_product(&line.product, Some(line.quantity))
}

/// Build the value-bearing payload for a set of cart lines: value is the
/// sum of price × quantity, item order mirrors the input order, and the
/// currency is left for the gateway to default.
pub fn payload_from_lines(lines: &[CartLine]) -> EcommerceParams {
    EcommerceParams {
        currency: None,
        value: lines.iter().map(CartLine::subtotal).sum(),
        items: lines.iter().map(item_from_line).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::types::ItemId;

    fn product(id: i64, name: &str, price: f64, category: &str) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            price,
            category: Some(category.into()),
            brand: None,
        }
    }

    #[test]
    fn test_product_maps_with_default_quantity() {
        let item = item_from_product(&product(1, "X", 10.0, "A"), None);
        assert_eq!(item.item_id, ItemId::Int(1));
        assert_eq!(item.item_name, "X");
        assert_eq!(item.price, Some(10.0));
        assert_eq!(item.quantity, Some(1));
        assert_eq!(item.item_category.as_deref(), Some("A"));
    }

    #[test]
    fn test_line_uses_own_quantity() {
        let line = CartLine::new(product(2, "Y", 5.0, "B"), 4);
        let item = item_from_line(&line);
        assert_eq!(item.quantity, Some(4));
    }

    #[test]
    fn test_payload_sums_and_preserves_order() {
        let lines = vec![
            CartLine::new(product(1, "X", 10.0, "A"), 2),
            CartLine::new(product(2, "Y", 5.0, "B"), 1),
        ];
        let payload = payload_from_lines(&lines);
        assert_eq!(payload.value, 25.0);
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].item_id, ItemId::Int(1));
        assert_eq!(payload.items[1].item_id, ItemId::Int(2));
        assert!(payload.currency.is_none());
    }

    #[test]
    fn test_empty_cart_is_zero_valued() {
        let payload = payload_from_lines(&[]);
        assert_eq!(payload.value, 0.0);
        assert!(payload.items.is_empty());
    }
}
