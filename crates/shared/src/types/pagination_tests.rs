use super::pagination::{PageRequest, PageResponse};

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 20);
}

#[test]
fn test_page_request_offset() {
    let request = PageRequest {
        page: 1,
        per_page: 20,
    };
    assert_eq!(request.offset(), 0);

    let request = PageRequest {
        page: 3,
        per_page: 25,
    };
    assert_eq!(request.offset(), 50);
}

#[test]
fn test_page_request_offset_saturates_at_page_zero() {
    let request = PageRequest {
        page: 0,
        per_page: 20,
    };
    assert_eq!(request.offset(), 0);
}

#[test]
fn test_page_response_rounds_total_pages_up() {
    let request = PageRequest {
        page: 1,
        per_page: 10,
    };
    let response = PageResponse::new(vec![1, 2, 3], request, 31);
    assert_eq!(response.total_pages, 4);
    assert_eq!(response.total, 31);
}

#[test]
fn test_page_response_empty_has_one_page() {
    let request = PageRequest::default();
    let response: PageResponse<i32> = PageResponse::new(vec![], request, 0);
    assert_eq!(response.total_pages, 1);
}
